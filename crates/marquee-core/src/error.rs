//! Error types for Marquee Core

use thiserror::Error;

/// Result type alias for decision-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Decision-engine error types
#[derive(Error, Debug)]
pub enum Error {
    // Manifest errors
    #[error("Failed to parse manifest: {0}")]
    ManifestParse(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    // Adaptation errors
    #[error("Invalid playlist: adaptation logic requires at least one representation")]
    InvalidPlaylist,

    // Preload errors
    #[error("Preload queue is full")]
    PreloadQueueFull,

    #[error("Preload coordinator is shut down")]
    PreloadShutdown,

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if this error is recoverable by retrying the request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::PreloadQueueFull | Error::Io(_)
        )
    }

    /// Returns the error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::ManifestParse(_) => "MANIFEST_PARSE",
            Error::InvalidManifest(_) => "INVALID_MANIFEST",
            Error::InvalidPlaylist => "INVALID_PLAYLIST",
            Error::PreloadQueueFull => "PRELOAD_QUEUE_FULL",
            Error::PreloadShutdown => "PRELOAD_SHUTDOWN",
            Error::Network(_) => "NETWORK",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Io(_) => "IO",
        }
    }
}
