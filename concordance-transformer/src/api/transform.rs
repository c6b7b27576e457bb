//! Transform endpoints
//!
//! - `POST /transform`: convert the payload and return the canonical record
//! - `POST /transform/send`: convert and forward the record to the writer

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use concordance_common::transaction_id::TRANSACTION_ID_HEADER;
use serde::Serialize;
use tracing::{error, info};

use super::TransactionId;
use crate::converter::{convert_payload, Conversion};
use crate::error::ConversionError;
use crate::status::ResultStatus;
use crate::AppState;

/// Message envelope used for every non-record response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Build transform routes
pub fn transform_routes() -> Router<AppState> {
    Router::new()
        .route("/transform", post(transform))
        .route("/transform/send", post(transform_and_send))
}

/// POST /transform
pub async fn transform(TransactionId(tid): TransactionId, body: Bytes) -> Response {
    let conversion = convert(&body, &tid);
    let concept_id = conversion.concept_id.clone();

    match conversion.into_result() {
        Ok(record) => {
            info!(transaction_id = %tid, uuid = %concept_id, "Served concordance request");
            with_transaction_id(StatusCode::OK, &tid, Json(record))
        }
        Err(err) => conversion_error(&tid, &concept_id, err),
    }
}

/// POST /transform/send
pub async fn transform_and_send(
    State(state): State<AppState>,
    TransactionId(tid): TransactionId,
    body: Bytes,
) -> Response {
    let conversion = convert(&body, &tid);
    let concept_id = conversion.concept_id.clone();

    let record = match conversion.into_result() {
        Ok(record) => record,
        Err(err) => return conversion_error(&tid, &concept_id, err),
    };

    match state.dispatcher.dispatch(&record, &tid).await {
        Ok(status) => {
            info!(transaction_id = %tid, uuid = %concept_id, status = %status, "Served concordance send request");
            message(status.http_status(), &tid, send_message(status))
        }
        Err(err) => {
            error!(transaction_id = %tid, uuid = %concept_id, status = %err.status(), "{}", err);
            message(err.status().http_status(), &tid, err.to_string())
        }
    }
}

/// Convert a request body; non UTF-8 bodies are malformed payloads
fn convert(body: &[u8], tid: &str) -> Conversion {
    match std::str::from_utf8(body) {
        Ok(payload) => convert_payload(payload, tid),
        Err(e) => Conversion {
            status: ResultStatus::SyntacticallyIncorrect,
            concept_id: String::new(),
            record: Default::default(),
            error: Some(ConversionError::MalformedPayload(e.to_string())),
        },
    }
}

/// Success message of a dispatched record
fn send_message(status: ResultStatus) -> &'static str {
    match status {
        ResultStatus::Valid => "Concordance record forwarded to writer",
        ResultStatus::NoContent => "Concordance record successfully deleted",
        ResultStatus::NotFound => "Concordance record not found",
        ResultStatus::SyntacticallyIncorrect
        | ResultStatus::SemanticallyIncorrect
        | ResultStatus::InternalError
        | ResultStatus::ServiceUnavailable => "Concordance record was not forwarded to writer",
    }
}

fn conversion_error(tid: &str, concept_id: &str, err: ConversionError) -> Response {
    let status = err.status();
    match status {
        ResultStatus::SemanticallyIncorrect => {
            error!(transaction_id = %tid, uuid = %concept_id, status = %status, "Bad json: {}", err)
        }
        _ => error!(transaction_id = %tid, uuid = %concept_id, status = %status, "Bad request: {}", err),
    }
    message(status.http_status(), tid, err.to_string())
}

fn message(status: StatusCode, tid: &str, message: impl Into<String>) -> Response {
    with_transaction_id(
        status,
        tid,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
}

fn with_transaction_id(status: StatusCode, tid: &str, body: impl IntoResponse) -> Response {
    (status, [(TRANSACTION_ID_HEADER, tid.to_string())], body).into_response()
}
