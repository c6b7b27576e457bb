//! Smartlogic payload validation and conversion
//!
//! Turns a raw concept payload into a [`ConcordanceRecord`]. Validation stops
//! at the first failure; the concept id and the ids collected up to that point
//! are still returned so the caller can log them.

use crate::error::ConversionError;
use crate::identifier::derive_concorded_id;
use crate::model::{ConcordanceRecord, RawConceptRecord, THING_URI_PREFIX};
use crate::status::ResultStatus;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error};

static UUID_MATCHER: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("UUID pattern is a valid regex")
});

/// Result of converting one payload
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub status: ResultStatus,
    /// Concept UUID, empty when the concept URI was missing or invalid
    pub concept_id: String,
    pub record: ConcordanceRecord,
    pub error: Option<ConversionError>,
}

impl Conversion {
    fn valid(record: ConcordanceRecord) -> Self {
        Self {
            status: ResultStatus::Valid,
            concept_id: record.concept_id.clone(),
            record,
            error: None,
        }
    }

    fn rejected(error: ConversionError, record: ConcordanceRecord) -> Self {
        Self {
            status: error.status(),
            concept_id: record.concept_id.clone(),
            record,
            error: Some(error),
        }
    }

    /// Collapse into a `Result`, dropping the partial record on failure
    pub fn into_result(self) -> Result<ConcordanceRecord, ConversionError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.record),
        }
    }
}

/// Parse and convert a raw payload string
///
/// `tid` is only used for log correlation.
pub fn convert_payload(payload: &str, tid: &str) -> Conversion {
    debug!(transaction_id = %tid, "Processing message with body: {}", payload);

    match serde_json::from_str::<RawConceptRecord>(payload) {
        Ok(raw) => convert_concepts(raw, tid),
        Err(e) => {
            error!(transaction_id = %tid, error = %e, "Failed to decode concept payload");
            Conversion::rejected(
                ConversionError::MalformedPayload(e.to_string()),
                ConcordanceRecord::default(),
            )
        }
    }
}

/// Convert an already parsed payload
pub fn convert_concepts(raw: RawConceptRecord, tid: &str) -> Conversion {
    let conversion = match raw.concepts.as_slice() {
        [] => Conversion::rejected(ConversionError::MissingGraph, ConcordanceRecord::default()),
        [concept] => match extract_concept_uuid(&concept.id) {
            None => Conversion::rejected(
                ConversionError::MissingOrInvalidId,
                ConcordanceRecord::default(),
            ),
            Some(concept_id) => {
                let mut record = ConcordanceRecord::new(concept_id, Vec::new());
                match collect_concorded_ids(
                    concept.alternate_ids.iter().map(|a| a.value.as_str()),
                    &mut record,
                ) {
                    Ok(()) => Conversion::valid(record),
                    Err(err) => Conversion::rejected(err, record),
                }
            }
        },
        _ => Conversion::rejected(
            ConversionError::UnsupportedMultipleConcepts,
            ConcordanceRecord::default(),
        ),
    };

    match &conversion.error {
        Some(err) => error!(
            transaction_id = %tid,
            uuid = %conversion.concept_id,
            status = %conversion.status,
            "{}", err
        ),
        None => debug!(
            transaction_id = %tid,
            uuid = %conversion.concept_id,
            concorded_ids = conversion.record.concorded_ids.len(),
            "Concordance record is: {:?}", conversion.record
        ),
    }

    conversion
}

/// Derive concorded ids in input order
///
/// Each identifier is checked for format, then self-reference, then
/// duplication; the first failure stops processing.
fn collect_concorded_ids<'a>(
    raw_ids: impl Iterator<Item = &'a str>,
    record: &mut ConcordanceRecord,
) -> Result<(), ConversionError> {
    for raw in raw_ids {
        let derived = derive_concorded_id(raw)?;
        if derived == record.concept_id {
            return Err(ConversionError::SelfReferentialConcordance);
        }
        if record.concorded_ids.contains(&derived) {
            return Err(ConversionError::DuplicateConcordance);
        }
        record.concorded_ids.push(derived);
    }
    Ok(())
}

/// Extract the concept UUID from a `http://www.ft.com/thing/<uuid>` URI
///
/// Returns `None` when the prefix is missing or the remainder is not a
/// lowercase canonical UUID.
pub fn extract_concept_uuid(uri: &str) -> Option<&str> {
    uri.strip_prefix(THING_URI_PREFIX)
        .filter(|candidate| UUID_MATCHER.is_match(candidate))
}
