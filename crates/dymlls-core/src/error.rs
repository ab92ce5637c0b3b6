//! Error types for dymlls-core.
//!
//! This module defines the canonical error type for the session engine.
//! Toolchain failures have their own types in [`crate::dyml`] because they
//! are turned into diagnostics rather than propagated.

use std::path::PathBuf;

/// The main error type for dymlls-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Document is not open in the session.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// Document limit exceeded.
    #[error("document limit exceeded: {current}/{max}")]
    DocumentLimitExceeded {
        /// Current number of documents.
        current: usize,
        /// Maximum allowed documents.
        max: usize,
    },

    /// File size limit exceeded.
    #[error("file size limit exceeded: {size} bytes (max: {max} bytes)")]
    FileSizeLimitExceeded {
        /// Actual content size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Request or notification parameters did not match the method's shape.
    #[error("invalid params for '{method}': {source}")]
    InvalidParams {
        /// Method whose params failed to decode.
        method: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed LSP framing or envelope.
    #[error("LSP protocol error: {0}")]
    LspProtocolError(String),

    /// The client closed the input stream.
    #[error("LSP input stream closed")]
    TransportClosed,
}

/// A specialized Result type for dymlls-core operations.
pub type Result<T> = std::result::Result<T, Error>;
