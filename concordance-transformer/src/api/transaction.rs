//! Transaction id extractor

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use concordance_common::transaction_id::{self, TRANSACTION_ID_HEADER};
use std::convert::Infallible;

/// Transaction id of the request, generated when the caller sent none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for TransactionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let supplied = parts
            .headers
            .get(TRANSACTION_ID_HEADER)
            .and_then(|v| v.to_str().ok());

        Ok(TransactionId(transaction_id::from_header(supplied)))
    }
}
