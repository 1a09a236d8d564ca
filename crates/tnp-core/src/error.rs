//! Error types for the tag-and-probe pipeline.

use thiserror::Error;

/// Tag-and-probe error type.
#[derive(Error, Debug)]
pub enum TnpError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error (malformed or missing config file). Fatal:
    /// reported before any event is processed.
    #[error("config error in '{path}': {message}")]
    Config {
        /// Path to the offending configuration file.
        path: String,
        /// Parser or validation message (includes line/column when the
        /// parser provides them).
        message: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TnpError>;
