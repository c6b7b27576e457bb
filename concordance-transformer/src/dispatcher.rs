//! Write-or-delete dispatch to the concordance writer
//!
//! A record with concorded ids is an active concordance and is upserted; a
//! record without any is a retraction and the writer's copy is deleted. Both
//! operations are idempotent at the writer, so a single attempt is made.

use crate::converter::convert_payload;
use crate::error::{DispatchError, ProcessingError, WriterOperation};
use crate::model::ConcordanceRecord;
use crate::status::ResultStatus;
use crate::writer::ConcordanceWriter;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Forwards canonical records to the writer
#[derive(Clone)]
pub struct Dispatcher {
    writer: Arc<dyn ConcordanceWriter>,
    topic: String,
}

impl Dispatcher {
    pub fn new(writer: Arc<dyn ConcordanceWriter>, topic: impl Into<String>) -> Self {
        Self {
            writer,
            topic: topic.into(),
        }
    }

    pub fn writer(&self) -> &Arc<dyn ConcordanceWriter> {
        &self.writer
    }

    /// Issue the write or delete request for `record`
    ///
    /// Success is `Valid` for writes, `NoContent` or `NotFound` for deletes.
    pub async fn dispatch(
        &self,
        record: &ConcordanceRecord,
        tid: &str,
    ) -> Result<ResultStatus, DispatchError> {
        if record.has_concordance() {
            debug!(transaction_id = %tid, uuid = %record.concept_id, "Concordance found; forwarding request to writer");
            self.write(record, tid).await
        } else {
            debug!(transaction_id = %tid, uuid = %record.concept_id, "No concordance found; making delete request");
            self.delete(&record.concept_id, tid).await
        }
    }

    async fn write(&self, record: &ConcordanceRecord, tid: &str) -> Result<ResultStatus, DispatchError> {
        let operation = WriterOperation::Write;
        let status = self
            .writer
            .write(record, tid)
            .await
            .map_err(|source| unavailable(operation, source, tid, &record.concept_id))?;

        match status {
            200 | 201 => Ok(ResultStatus::Valid),
            other => Err(unexpected(operation, other, tid, &record.concept_id)),
        }
    }

    async fn delete(&self, concept_id: &str, tid: &str) -> Result<ResultStatus, DispatchError> {
        let operation = WriterOperation::Delete;
        let status = self
            .writer
            .delete(concept_id, tid)
            .await
            .map_err(|source| unavailable(operation, source, tid, concept_id))?;

        match status {
            204 => Ok(ResultStatus::NoContent),
            404 => Ok(ResultStatus::NotFound),
            other => Err(unexpected(operation, other, tid, concept_id)),
        }
    }

    /// Convert and dispatch one stream event
    ///
    /// Conversion failures short-circuit; no writer call is made for them.
    pub async fn process_event(&self, body: &str, tid: &str) -> Result<ResultStatus, ProcessingError> {
        let record = convert_payload(body, tid).into_result()?;
        let status = self.dispatch(&record, tid).await?;

        info!(
            transaction_id = %tid,
            uuid = %record.concept_id,
            topic = %self.topic,
            status = %status,
            "Forwarded concordance record to rw"
        );
        Ok(status)
    }
}

fn unavailable(
    operation: WriterOperation,
    source: crate::error::WriterError,
    tid: &str,
    concept_id: &str,
) -> DispatchError {
    let err = DispatchError::Unavailable { operation, source };
    error!(transaction_id = %tid, uuid = %concept_id, "{}", err);
    err
}

fn unexpected(operation: WriterOperation, status: u16, tid: &str, concept_id: &str) -> DispatchError {
    let err = DispatchError::UnexpectedStatus { operation, status };
    error!(transaction_id = %tid, uuid = %concept_id, status, "{}", err);
    err
}
