use thiserror::Error;

/// Crate-wide error type.
///
/// Every failure surfaces immediately to the caller; there is no retry or
/// partial-success handling anywhere in the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad constructor arguments or an oversized image
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing folder or file
    #[error("not found: {0}")]
    NotFound(String),

    /// Record store unreachable or unreadable
    #[error("store connection error: {0}")]
    Connection(String),

    /// Operation invoked in the wrong mode
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Image could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Decoded image shape disagrees with the probed sample dimensions
    #[error("shape mismatch for {path}: expected {expected}, got {actual}")]
    Shape {
        path: String,
        expected: String,
        actual: String,
    },

    /// IO error outside the store path
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Specialized Result type for dataset building operations.
pub type Result<T> = std::result::Result<T, Error>;
