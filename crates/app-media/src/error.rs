use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("URL is required")]
    MissingParameter,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch media info: {0}")]
    ExtractionFailed(String),

    #[error("Media extraction timed out after {0:?}")]
    ExtractionTimeout(Duration),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Media not found. It might be a private post.")]
    MediaNotFound,

    #[error("Connection failed: {0}")]
    UpstreamConnectionFailed(String),

    #[error("Too many downloads in progress, try again in a moment")]
    Busy,
}

impl MediaError {
    /// Extraction problems on a download path are the server's fault, not the caller's
    #[must_use]
    pub fn into_download_failure(self) -> Self {
        match self {
            Self::ExtractionFailed(msg) => Self::DownloadFailed(msg),
            e => e,
        }
    }
}
