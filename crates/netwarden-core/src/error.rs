//! Error types for netwarden

use thiserror::Error;

/// Main error type for netwarden operations
#[derive(Error, Debug)]
pub enum NetWardenError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error with context
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The OS refused to disclose socket or ownership information
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl NetWardenError {
    /// Whether this error is the enumeration permission signal
    pub fn is_permission_denied(&self) -> bool {
        match self {
            NetWardenError::PermissionDenied(_) => true,
            NetWardenError::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for NetWardenError {
    fn from(err: serde_json::Error) -> Self {
        NetWardenError::Serialization(err.to_string())
    }
}

/// Result type alias for netwarden operations
pub type Result<T> = std::result::Result<T, NetWardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_detection() {
        assert!(NetWardenError::PermissionDenied("/proc/net/tcp".into()).is_permission_denied());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(NetWardenError::from(io).is_permission_denied());

        assert!(!NetWardenError::NotFound("x".into()).is_permission_denied());
    }
}
