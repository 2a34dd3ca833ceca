//! Error types for stowage-journal

use thiserror::Error;

/// Journal error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid date range
    #[error("Invalid date range: {0}..{1}")]
    InvalidDateRange(String, String),

    /// Unknown action type in a query
    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    /// Export error
    #[error("Export error: {0}")]
    ExportError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, Error>;
