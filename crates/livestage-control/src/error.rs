//! Error types for the session server
use thiserror::Error;

/// Session server errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// HTTP server error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A channel frame could not be decoded
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid request parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Admin access refused
    #[error("Forbidden")]
    Forbidden,
}

/// Result type for session server operations
pub type Result<T> = std::result::Result<T, ControlError>;
