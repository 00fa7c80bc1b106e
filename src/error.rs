//! Error types for docshare.

use thiserror::Error;

/// Common error type for docshare.
#[derive(Error, Debug)]
pub enum DocshareError {
    /// Malformed or missing request input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A single file is larger than the per-file limit.
    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge {
        /// Declared size of the rejected upload.
        size: u64,
        /// Per-file limit in bytes.
        limit: u64,
    },

    /// Accepting the upload would push total usage over the capacity limit.
    #[error("storage quota exceeded: {used} bytes used, {requested} requested, {limit} allowed")]
    QuotaExceeded {
        /// Aggregate usage at admission time.
        used: u64,
        /// Size of the rejected upload.
        requested: u64,
        /// Total-capacity limit in bytes.
        limit: u64,
    },

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Blob store failure other than a missing object.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DocshareError {
    fn from(e: sqlx::Error) -> Self {
        DocshareError::Database(e.to_string())
    }
}

/// Result type alias for docshare operations.
pub type Result<T> = std::result::Result<T, DocshareError>;
