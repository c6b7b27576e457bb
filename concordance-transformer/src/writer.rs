//! Concordance writer client
//!
//! The writer is the storage service persisting concordance records under
//! `<base>concordances/<uuid>`. The trait lets the dispatcher and the health
//! checks run against a stub in tests.

use crate::error::WriterError;
use crate::model::ConcordanceRecord;
use async_trait::async_trait;
use concordance_common::transaction_id::TRANSACTION_ID_HEADER;
use std::time::Duration;

/// Path segment of concordance resources on the writer
const CONCORDANCES_PATH: &str = "concordances/";

/// Readiness endpoint of the writer
const GOOD_TO_GO_PATH: &str = "__gtg";

/// Operations the transformer needs from the writer
///
/// Each call returns the writer's HTTP status code; interpreting it is the
/// caller's job. Only transport failures are errors.
#[async_trait]
pub trait ConcordanceWriter: Send + Sync {
    /// PUT the full record
    async fn write(&self, record: &ConcordanceRecord, tid: &str) -> Result<u16, WriterError>;

    /// DELETE the record for `concept_id`
    async fn delete(&self, concept_id: &str, tid: &str) -> Result<u16, WriterError>;

    /// GET the readiness endpoint
    async fn good_to_go(&self) -> Result<u16, WriterError>;

    /// Address probed by [`ConcordanceWriter::good_to_go`], for diagnostics
    fn good_to_go_url(&self) -> String;
}

/// reqwest-backed writer client
#[derive(Debug, Clone)]
pub struct HttpConcordanceWriter {
    http_client: reqwest::Client,
    base_address: String,
}

impl HttpConcordanceWriter {
    /// Create a client with its own connection pool
    ///
    /// `base_address` is normalised to end with `/`.
    pub fn new(base_address: &str, timeout: Duration) -> Result<Self, WriterError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(128)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self::with_client(http_client, base_address))
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(http_client: reqwest::Client, base_address: &str) -> Self {
        Self {
            http_client,
            base_address: normalise_base_address(base_address),
        }
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Resource URL of a concordance record
    pub fn concordance_url(&self, concept_id: &str) -> String {
        format!("{}{}{}", self.base_address, CONCORDANCES_PATH, concept_id)
    }
}

#[async_trait]
impl ConcordanceWriter for HttpConcordanceWriter {
    async fn write(&self, record: &ConcordanceRecord, tid: &str) -> Result<u16, WriterError> {
        let response = self
            .http_client
            .put(self.concordance_url(&record.concept_id))
            .header(TRANSACTION_ID_HEADER, tid)
            .json(record)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }

    async fn delete(&self, concept_id: &str, tid: &str) -> Result<u16, WriterError> {
        let response = self
            .http_client
            .delete(self.concordance_url(concept_id))
            .header(TRANSACTION_ID_HEADER, tid)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }

    async fn good_to_go(&self) -> Result<u16, WriterError> {
        let response = self.http_client.get(self.good_to_go_url()).send().await?;
        Ok(response.status().as_u16())
    }

    fn good_to_go_url(&self) -> String {
        format!("{}{}", self.base_address, GOOD_TO_GO_PATH)
    }
}

fn normalise_base_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}
