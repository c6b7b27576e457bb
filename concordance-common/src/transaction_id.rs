//! Transaction id utilities
//!
//! A transaction id is the correlation token that joins the logs of every
//! service an event passes through. It travels in the `X-Request-Id` header.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Header carrying the transaction id
pub const TRANSACTION_ID_HEADER: &str = "X-Request-Id";

/// Prefix of generated transaction ids
const GENERATED_PREFIX: &str = "tid_";

/// Generate a new transaction id, e.g. `tid_a8Kq2Lm0Zx`
pub fn generate() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("{}{}", GENERATED_PREFIX, suffix)
}

/// Use the supplied transaction id, or generate one when absent or blank
pub fn from_header(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(tid) if !tid.is_empty() => tid.to_string(),
        _ => generate(),
    }
}
