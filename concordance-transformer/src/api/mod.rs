//! HTTP API for concordance-transformer

pub mod admin;
pub mod buildinfo;
pub mod transaction;
pub mod transform;

use axum::body::Body;
use axum::http::Request;
use concordance_common::transaction_id::TRANSACTION_ID_HEADER;

pub use admin::admin_routes;
pub use buildinfo::get_build_info;
pub use transaction::TransactionId;
pub use transform::transform_routes;

/// Span for a traced request, carrying the caller's transaction id when sent
pub fn request_span(request: &Request<Body>) -> tracing::Span {
    let transaction_id = request
        .headers()
        .get(TRANSACTION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        transaction_id = %transaction_id,
    )
}
