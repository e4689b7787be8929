//! Error types for blocklist loading and refresh

use std::path::PathBuf;
use thiserror::Error;

/// Result type for blocklist operations
pub type RefreshResult<T> = std::result::Result<T, RefreshError>;

/// Failures while loading or refreshing the blocklist.
///
/// None of these replace the current snapshot; the previous one stays live.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Remote fetch failed
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// Local file could not be read or written
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document yielded no entries
    #[error("Blocklist from {0} contains no entries")]
    Empty(String),

    /// The response body could not be decoded as text
    #[error("Failed to decode blocklist from {url}: {message}")]
    Decode { url: String, message: String },
}

impl RefreshError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RefreshError::Io {
            path: path.into(),
            source,
        }
    }
}
