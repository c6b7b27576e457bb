//! # Concordance Common Library
//!
//! Shared code for the concordance services:
//! - Common error type
//! - Layered configuration loading (CLI/env > TOML file > defaults)
//! - Logging initialisation
//! - Transaction (correlation) id handling

pub mod config;
pub mod error;
pub mod logging;
pub mod transaction_id;

pub use error::{Error, Result};
