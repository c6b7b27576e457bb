//! Alternate identifier to canonical id derivation
//!
//! TME identifiers are two non-empty segments joined by a single `-`. The
//! canonical id is the name-based (MD5, version 3) UUID of the full raw string
//! under the nil namespace, so every service deriving it agrees on the result.

use crate::error::ConversionError;
use uuid::Uuid;

/// Separator between the two identifier segments
pub const IDENTIFIER_DELIMITER: char = '-';

/// Validate an alternate identifier and derive its canonical UUID
pub fn derive_concorded_id(raw: &str) -> Result<String, ConversionError> {
    let mut segments = raw.split(IDENTIFIER_DELIMITER);
    let well_formed = matches!(
        (segments.next(), segments.next(), segments.next()),
        (Some(first), Some(second), None) if !first.is_empty() && !second.is_empty()
    );

    if !well_formed {
        return Err(ConversionError::InvalidIdentifierFormat(raw.to_string()));
    }

    Ok(Uuid::new_v3(&Uuid::nil(), raw.as_bytes()).to_string())
}
