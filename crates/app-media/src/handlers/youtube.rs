use std::sync::Arc;

use app_helpers::file_name::{sanitize_file_name, MAX_FILENAME_LENGTH};
use tracing::{debug, warn};

use super::{MediaDownload, PlatformHandler, VIDEO_CONTENT_TYPE};
use crate::{
    classify::Platform,
    error::MediaError,
    extractor::{MediaExtractor, StreamRequest},
    info::MediaInfo,
    request::MediaRequest,
};

pub struct YouTubeHandler {
    extractor: Arc<dyn MediaExtractor>,
}
impl YouTubeHandler {
    pub fn new(extractor: Arc<dyn MediaExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait::async_trait]
impl PlatformHandler for YouTubeHandler {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn fetch_info(&self, request: &MediaRequest) -> Result<MediaInfo, MediaError> {
        if let Some(video_id) = request.identifier() {
            debug!(video_id, "Answering YouTube info from the video id");
            return Ok(MediaInfo::youtube(video_id));
        }

        self.extractor
            .fetch_info(&request.url, None)
            .await
            .map(MediaInfo::from)
    }

    async fn stream_download(&self, request: &MediaRequest) -> Result<MediaDownload, MediaError> {
        let format = request.quality.format_selector();

        let info = self
            .extractor
            .fetch_info(&request.url, Some(format))
            .await
            .map_err(|e| {
                warn!(?e, url = %request.url, "Failed to resolve YouTube download");
                e.into_download_failure()
            })?;

        let title = info
            .title
            .as_deref()
            .map(|x| sanitize_file_name(x, MAX_FILENAME_LENGTH))
            .filter(|x| !x.is_empty())
            .unwrap_or_else(|| "video".to_string());
        let ext = info
            .ext
            .as_deref()
            .map(|x| sanitize_file_name(x, 10))
            .filter(|x| !x.is_empty())
            .unwrap_or_else(|| "mp4".to_string());

        let body = self
            .extractor
            .stream(StreamRequest::new(request.url.clone(), format))
            .await
            .map_err(MediaError::into_download_failure)?;

        Ok(MediaDownload {
            content_type: VIDEO_CONTENT_TYPE.to_string(),
            file_name: format!("{title}.{ext}"),
            body,
        })
    }
}
