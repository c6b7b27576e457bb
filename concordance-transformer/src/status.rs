//! Processing outcome classification

use axum::http::StatusCode;
use std::fmt;

/// Outcome of processing one event
///
/// Produced once per processing attempt and consumed by the HTTP layer or the
/// stream consumer; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultStatus {
    /// Delete acknowledged by the writer, record never existed
    NotFound,
    /// Payload is structurally wrong (bad identifiers, unparsable JSON)
    SyntacticallyIncorrect,
    /// Payload parses but violates concept rules
    SemanticallyIncorrect,
    /// Record converted, or written by the writer
    Valid,
    /// Writer answered with an unexpected status
    InternalError,
    /// Writer could not be reached
    ServiceUnavailable,
    /// Delete acknowledged by the writer, record removed
    NoContent,
}

impl ResultStatus {
    /// Externally visible HTTP status
    ///
    /// `NoContent` and `NotFound` are successful deletes from the caller's point
    /// of view and surface as 200 with distinct messages.
    pub fn http_status(self) -> StatusCode {
        match self {
            ResultStatus::Valid | ResultStatus::NoContent | ResultStatus::NotFound => StatusCode::OK,
            ResultStatus::SyntacticallyIncorrect => StatusCode::BAD_REQUEST,
            ResultStatus::SemanticallyIncorrect => StatusCode::UNPROCESSABLE_ENTITY,
            ResultStatus::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ResultStatus::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_success(self) -> bool {
        match self {
            ResultStatus::Valid | ResultStatus::NoContent | ResultStatus::NotFound => true,
            ResultStatus::SyntacticallyIncorrect
            | ResultStatus::SemanticallyIncorrect
            | ResultStatus::ServiceUnavailable
            | ResultStatus::InternalError => false,
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultStatus::NotFound => "not_found",
            ResultStatus::SyntacticallyIncorrect => "syntactically_incorrect",
            ResultStatus::SemanticallyIncorrect => "semantically_incorrect",
            ResultStatus::Valid => "valid",
            ResultStatus::InternalError => "internal_error",
            ResultStatus::ServiceUnavailable => "service_unavailable",
            ResultStatus::NoContent => "no_content",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_status_to_http_code() {
        let cases = [
            (ResultStatus::Valid, 200),
            (ResultStatus::NoContent, 200),
            (ResultStatus::NotFound, 200),
            (ResultStatus::SyntacticallyIncorrect, 400),
            (ResultStatus::SemanticallyIncorrect, 422),
            (ResultStatus::ServiceUnavailable, 503),
            (ResultStatus::InternalError, 500),
        ];

        for (status, code) in cases {
            assert_eq!(status.http_status().as_u16(), code, "{}", status);
        }
    }

    #[test]
    fn deletes_count_as_success() {
        assert!(ResultStatus::NoContent.is_success());
        assert!(ResultStatus::NotFound.is_success());
        assert!(!ResultStatus::InternalError.is_success());
    }
}
