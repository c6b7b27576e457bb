//! Error types for concordance-transformer
//!
//! Every error maps to exactly one [`ResultStatus`]; none of them is fatal to
//! the process.

use crate::status::ResultStatus;
use std::fmt;
use thiserror::Error;

/// Validation failures while converting a Smartlogic payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// Payload is not valid JSON for the expected shape
    #[error("Error whilst processing request body: {0}")]
    MalformedPayload(String),

    #[error("Invalid Request Json: Missing/invalid @graph field")]
    MissingGraph,

    #[error("Invalid Request Json: More than 1 concept in smartlogic concept payload which is currently not supported")]
    UnsupportedMultipleConcepts,

    #[error("Invalid Request Json: Missing/invalid @id field")]
    MissingOrInvalidId,

    /// Alternate identifier is not two non-empty `-` delimited segments
    #[error("Bad Request: Concordance id {0} is not a valid TME Id")]
    InvalidIdentifierFormat(String),

    #[error("Bad Request: Payload from smartlogic has a smartlogic uuid that is the same as the uuid generated from the TME id")]
    SelfReferentialConcordance,

    #[error("Bad Request: Payload from smartlogic contains duplicate TME id values")]
    DuplicateConcordance,
}

impl ConversionError {
    pub fn status(&self) -> ResultStatus {
        match self {
            ConversionError::MissingGraph
            | ConversionError::UnsupportedMultipleConcepts
            | ConversionError::MissingOrInvalidId => ResultStatus::SemanticallyIncorrect,
            ConversionError::MalformedPayload(_)
            | ConversionError::InvalidIdentifierFormat(_)
            | ConversionError::SelfReferentialConcordance
            | ConversionError::DuplicateConcordance => ResultStatus::SyntacticallyIncorrect,
        }
    }
}

/// Transport-level failure talking to the writer
#[derive(Error, Debug)]
pub enum WriterError {
    /// Connection refused, DNS failure, timeout, ...
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for WriterError {
    fn from(err: reqwest::Error) -> Self {
        WriterError::Transport(err.to_string())
    }
}

/// Writer operation, used in log lines and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterOperation {
    Write,
    Delete,
}

impl fmt::Display for WriterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterOperation::Write => f.write_str("Write"),
            WriterOperation::Delete => f.write_str("Delete"),
        }
    }
}

/// Failure forwarding a record to the writer
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Service Unavailable: {operation} request to writer resulted in error: {source}")]
    Unavailable {
        operation: WriterOperation,
        #[source]
        source: WriterError,
    },

    #[error("Internal Error: {operation} request to writer returned unexpected status: {status}")]
    UnexpectedStatus {
        operation: WriterOperation,
        status: u16,
    },
}

impl DispatchError {
    pub fn status(&self) -> ResultStatus {
        match self {
            DispatchError::Unavailable { .. } => ResultStatus::ServiceUnavailable,
            DispatchError::UnexpectedStatus { .. } => ResultStatus::InternalError,
        }
    }
}

/// Failure processing a complete event (conversion plus dispatch)
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ProcessingError {
    pub fn status(&self) -> ResultStatus {
        match self {
            ProcessingError::Conversion(err) => err.status(),
            ProcessingError::Dispatch(err) => err.status(),
        }
    }
}

/// Message stream failures
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Stream {topic} is not available: {source}")]
    TopicUnavailable {
        topic: String,
        #[source]
        source: redis::RedisError,
    },

    /// No broker connection has been established yet
    #[error("Not connected to the stream broker")]
    NotConnected,
}

/// Health check failure, rendered into the health endpoints
#[derive(Error, Debug)]
pub enum HealthError {
    #[error("Error {detail} calling writer at {url}")]
    WriterUnreachable { url: String, detail: String },

    #[error("Writer {url} returned status {status}")]
    WriterUnhealthy { url: String, status: u16 },

    #[error("Stream connectivity check failed: {0}")]
    Stream(#[from] ConsumerError),
}
