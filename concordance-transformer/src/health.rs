//! Connectivity checks against the writer and the message stream
//!
//! The two checks are plain functions over the injected collaborators; the
//! admin endpoints decide how to present them.

use crate::consumer::ConnectivityCheck;
use crate::error::HealthError;
use crate::writer::ConcordanceWriter;
use chrono::{DateTime, Utc};
use serde::Serialize;

const PANIC_GUIDE: &str = "https://dewey.ft.com/smartlogic-concordance-transform.html";
const BUSINESS_IMPACT: &str = "Editorial updates of concept concordances will not be written into UPP";

/// Succeeds when the writer's readiness endpoint answers 200
pub async fn check_writer_connectivity(writer: &dyn ConcordanceWriter) -> Result<(), HealthError> {
    let url = writer.good_to_go_url();
    let status = writer
        .good_to_go()
        .await
        .map_err(|e| HealthError::WriterUnreachable {
            url: url.clone(),
            detail: e.to_string(),
        })?;

    if status != 200 {
        return Err(HealthError::WriterUnhealthy { url, status });
    }
    Ok(())
}

/// Succeeds when the stream broker answers and the topic exists
pub async fn check_stream_connectivity(stream: &dyn ConnectivityCheck) -> Result<(), HealthError> {
    stream.connectivity_check().await?;
    Ok(())
}

/// Static description of a health check
#[derive(Debug, Clone, Copy)]
pub struct CheckDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub severity: u8,
    pub business_impact: &'static str,
    pub technical_summary: &'static str,
    pub panic_guide: &'static str,
}

pub const WRITER_CHECK: CheckDescriptor = CheckDescriptor {
    id: "check-connectivity-to-concordance-rw",
    name: "Check connectivity to concordance reader/writer",
    severity: 3,
    business_impact: BUSINESS_IMPACT,
    technical_summary: "Check health of the concordance reader/writer",
    panic_guide: PANIC_GUIDE,
};

pub const STREAM_CHECK: CheckDescriptor = CheckDescriptor {
    id: "check-connectivity-to-message-stream",
    name: "Check connectivity to the message stream",
    severity: 3,
    business_impact: BUSINESS_IMPACT,
    technical_summary: "Check that the stream broker is healthy and the topic exists; if so restart this service",
    panic_guide: PANIC_GUIDE,
};

/// Outcome of one check in the health report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub id: String,
    pub name: String,
    pub ok: bool,
    pub severity: u8,
    pub business_impact: String,
    pub technical_summary: String,
    pub panic_guide: String,
    pub check_output: String,
    pub last_updated: DateTime<Utc>,
}

impl CheckResult {
    pub fn from_outcome(descriptor: &CheckDescriptor, outcome: &Result<(), HealthError>) -> Self {
        let (ok, check_output) = match outcome {
            Ok(()) => (true, "OK".to_string()),
            Err(e) => (false, e.to_string()),
        };

        Self {
            id: descriptor.id.to_string(),
            name: descriptor.name.to_string(),
            ok,
            severity: descriptor.severity,
            business_impact: descriptor.business_impact.to_string(),
            technical_summary: descriptor.technical_summary.to_string(),
            panic_guide: descriptor.panic_guide.to_string(),
            check_output,
            last_updated: Utc::now(),
        }
    }
}

/// Health report served on `/__health`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub schema_version: u8,
    pub system_code: String,
    pub name: String,
    pub description: String,
    pub checks: Vec<CheckResult>,
    pub ok: bool,
}

impl HealthReport {
    pub fn new(system_code: &str, name: &str, description: &str, checks: Vec<CheckResult>) -> Self {
        let ok = checks.iter().all(|c| c.ok);
        Self {
            schema_version: 1,
            system_code: system_code.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            checks,
            ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConsumerError, WriterError};
    use crate::model::ConcordanceRecord;
    use async_trait::async_trait;

    struct GtgWriter(Result<u16, String>);

    #[async_trait]
    impl ConcordanceWriter for GtgWriter {
        async fn write(&self, _: &ConcordanceRecord, _: &str) -> Result<u16, WriterError> {
            unreachable!("health checks never write")
        }

        async fn delete(&self, _: &str, _: &str) -> Result<u16, WriterError> {
            unreachable!("health checks never delete")
        }

        async fn good_to_go(&self) -> Result<u16, WriterError> {
            self.0.clone().map_err(WriterError::Transport)
        }

        fn good_to_go_url(&self) -> String {
            "http://writer/__gtg".to_string()
        }
    }

    fn topic_unavailable(topic: &str) -> ConsumerError {
        ConsumerError::TopicUnavailable {
            topic: topic.to_string(),
            source: redis::RedisError::from((redis::ErrorKind::ResponseError, "ERR no such key")),
        }
    }

    struct Stream(bool);

    #[async_trait]
    impl ConnectivityCheck for Stream {
        async fn connectivity_check(&self) -> Result<(), ConsumerError> {
            if self.0 {
                Ok(())
            } else {
                Err(topic_unavailable("SmartlogicConcept"))
            }
        }
    }

    #[tokio::test]
    async fn writer_check_passes_on_200() {
        assert!(check_writer_connectivity(&GtgWriter(Ok(200))).await.is_ok());
    }

    #[tokio::test]
    async fn writer_check_reports_status() {
        let err = check_writer_connectivity(&GtgWriter(Ok(503))).await.unwrap_err();
        assert_eq!(err.to_string(), "Writer http://writer/__gtg returned status 503");
    }

    #[tokio::test]
    async fn writer_check_reports_transport_error() {
        let err = check_writer_connectivity(&GtgWriter(Err("connection refused".into())))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert!(err.to_string().contains("http://writer/__gtg"));
    }

    #[tokio::test]
    async fn stream_check_propagates_failure() {
        assert!(check_stream_connectivity(&Stream(true)).await.is_ok());
        let err = check_stream_connectivity(&Stream(false)).await.unwrap_err();
        assert!(err.to_string().contains("SmartlogicConcept"));
    }

    #[test]
    fn report_is_ok_only_when_all_checks_pass() {
        let passing = CheckResult::from_outcome(&WRITER_CHECK, &Ok(()));
        let failing = CheckResult::from_outcome(
            &STREAM_CHECK,
            &Err(HealthError::Stream(topic_unavailable("t"))),
        );

        assert!(HealthReport::new("code", "name", "desc", vec![passing.clone()]).ok);
        let report = HealthReport::new("code", "name", "desc", vec![passing, failing]);
        assert!(!report.ok);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["schemaVersion"], 1);
        assert_eq!(json["checks"][1]["ok"], false);
        assert_eq!(json["checks"][1]["panicGuide"], PANIC_GUIDE);
    }

    #[test]
    fn stream_check_output_keeps_broker_cause() {
        let result = CheckResult::from_outcome(
            &STREAM_CHECK,
            &Err(HealthError::Stream(topic_unavailable("SmartlogicConcept"))),
        );

        assert!(!result.ok);
        assert!(result.check_output.contains("SmartlogicConcept"));
        assert!(result.check_output.contains("no such key"));
    }
}
