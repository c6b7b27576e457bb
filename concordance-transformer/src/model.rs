//! Wire types for inbound Smartlogic concepts and outbound concordance records

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix every concept URI must carry; the remainder is the concept UUID
pub const THING_URI_PREFIX: &str = "http://www.ft.com/thing/";

/// Inbound payload as published by Smartlogic
///
/// The collection is a JSON-LD graph; exactly one concept is supported.
/// A missing or null `@graph` deserializes to an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawConceptRecord {
    #[serde(rename = "@graph", default, deserialize_with = "null_as_default")]
    pub concepts: Vec<ConceptEntry>,
}

/// A single concept in the graph
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConceptEntry {
    /// Identifying URI, e.g. `http://www.ft.com/thing/<uuid>`
    #[serde(rename = "@id", default, deserialize_with = "null_as_default")]
    pub id: String,

    /// Alternate (TME) identifiers, in publication order
    #[serde(
        rename = "http://www.ft.com/ontology/TMEIdentifier",
        default,
        deserialize_with = "null_as_default"
    )]
    pub alternate_ids: Vec<AlternateIdentifier>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AlternateIdentifier {
    #[serde(rename = "@value", default, deserialize_with = "null_as_default")]
    pub value: String,
}

/// Canonical concordance record sent to the writer
///
/// `concorded_ids` keeps input order and never holds duplicates or the
/// concept's own id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConcordanceRecord {
    #[serde(rename = "uuid")]
    pub concept_id: String,
    #[serde(rename = "concordedIds")]
    pub concorded_ids: Vec<String>,
}

impl ConcordanceRecord {
    pub fn new(concept_id: impl Into<String>, concorded_ids: Vec<String>) -> Self {
        Self {
            concept_id: concept_id.into(),
            concorded_ids,
        }
    }

    /// True when the record asserts an active concordance
    pub fn has_concordance(&self) -> bool {
        !self.concorded_ids.is_empty()
    }
}

/// Treat an explicit JSON `null` the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
