use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("missing config file imgfetch.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("not a safe image type: {0}")]
    UnsafeType(String),

    #[error("file too large (over {} MiB)", .0 / (1024 * 1024))]
    TooLarge(u64),

    #[error("connection timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("server returned HTTP {0}")]
    HttpStatus(u16),

    #[error("image already saved (duplicate content)")]
    DuplicateContent,

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl FetchError {
    /// Failure classes that indicate a remote-side problem, used by the
    /// binary for exit-code mapping.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout | FetchError::ConnectionFailed(_) | FetchError::HttpStatus(_)
        )
    }
}
