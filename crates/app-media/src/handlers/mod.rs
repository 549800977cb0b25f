use std::sync::Arc;

use tracing::debug;
use url::Url;

pub use self::{generic::GenericHandler, instagram::InstagramHandler, youtube::YouTubeHandler};
use crate::{
    classify::Platform,
    error::MediaError,
    extractor::{ByteStream, MediaExtractor, StreamRequest},
    info::MediaInfo,
    quality::BEST_SINGLE_FILE,
    request::MediaRequest,
    web::WebFetcher,
};

mod generic;
mod instagram;
mod youtube;

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Everything needed to answer with an attachment
pub struct MediaDownload {
    pub content_type: String,
    pub file_name: String,
    pub body: ByteStream,
}

impl std::fmt::Debug for MediaDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaDownload")
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
pub trait PlatformHandler: Send + Sync {
    fn platform(&self) -> Platform;

    /// Preview metadata for the UI
    async fn fetch_info(&self, request: &MediaRequest) -> Result<MediaInfo, MediaError>;

    /// The file the user asked to save
    async fn stream_download(&self, request: &MediaRequest) -> Result<MediaDownload, MediaError>;
}

pub type HandlerEntry = Arc<dyn PlatformHandler>;

/// One handler per platform, sharing the same collaborators
#[derive(Clone)]
pub struct MediaHandlers {
    extractor: Arc<dyn MediaExtractor>,
    youtube: HandlerEntry,
    instagram: HandlerEntry,
    generic: HandlerEntry,
}

impl MediaHandlers {
    #[must_use]
    pub fn new(extractor: Arc<dyn MediaExtractor>, web: Arc<dyn WebFetcher>) -> Self {
        Self {
            youtube: Arc::new(YouTubeHandler::new(extractor.clone())),
            instagram: Arc::new(InstagramHandler::new(extractor.clone(), web.clone())),
            generic: Arc::new(GenericHandler::new(extractor.clone(), web)),
            extractor,
        }
    }

    #[must_use]
    pub fn for_platform(&self, platform: Platform) -> &dyn PlatformHandler {
        match platform {
            Platform::YouTube => self.youtube.as_ref(),
            Platform::Instagram => self.instagram.as_ref(),
            Platform::Generic => self.generic.as_ref(),
        }
    }

    #[must_use]
    pub fn for_request(&self, request: &MediaRequest) -> &dyn PlatformHandler {
        self.for_platform(request.platform())
    }

    pub async fn fetch_info(&self, request: &MediaRequest) -> Result<MediaInfo, MediaError> {
        debug!(platform = ?request.platform(), url = %request.url, "Fetching info");

        self.for_request(request).fetch_info(request).await
    }

    pub async fn stream_download(
        &self,
        request: &MediaRequest,
    ) -> Result<MediaDownload, MediaError> {
        debug!(
            platform = ?request.platform(),
            quality = %request.quality,
            url = %request.url,
            "Preparing download"
        );

        self.for_request(request).stream_download(request).await
    }

    /// Inline playback for the preview player.
    ///
    /// Not tied to a platform: whatever yt-dlp can play, at its best single-file quality.
    pub async fn preview_stream(&self, url: &Url) -> Result<ByteStream, MediaError> {
        debug!(%url, "Starting preview stream");

        self.extractor
            .stream(StreamRequest::new(url.clone(), BEST_SINGLE_FILE).with_user_agent())
            .await
    }
}

impl std::fmt::Debug for MediaHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaHandlers")
            .field("extractor", &self.extractor.name())
            .finish_non_exhaustive()
    }
}
