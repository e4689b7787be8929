//! Error types for capture storage

use thiserror::Error;

/// Result type for capture operations
pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Errors surfaced by the capture store
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No capture with this name exists
    #[error("Capture not found: {0}")]
    NotFound(String),

    /// The capture exists but its contents are not valid capture JSON
    #[error("Capture {name} is corrupt: {message}")]
    Parse { name: String, message: String },

    /// The name is not a plain file name inside the capture directory
    #[error("Invalid capture name: {0}")]
    InvalidName(String),

    /// A capture with this name was already written
    #[error("Capture already exists: {0}")]
    AlreadyExists(String),

    /// Records could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
