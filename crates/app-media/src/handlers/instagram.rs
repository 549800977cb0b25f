use std::sync::Arc;

use app_helpers::{file_name::sanitize_file_name, id::time_file_name};
use tracing::{debug, info, warn};
use url::Url;

use super::{MediaDownload, PlatformHandler, VIDEO_CONTENT_TYPE};
use crate::{
    classify::{clean_url, Platform},
    error::MediaError,
    extractor::{MediaExtractor, StreamRequest},
    info::MediaInfo,
    quality::BEST_SINGLE_FILE,
    request::MediaRequest,
    web::WebFetcher,
};

const MAX_TITLE_LENGTH: usize = 50;

pub struct InstagramHandler {
    extractor: Arc<dyn MediaExtractor>,
    web: Arc<dyn WebFetcher>,
}
impl InstagramHandler {
    pub fn new(extractor: Arc<dyn MediaExtractor>, web: Arc<dyn WebFetcher>) -> Self {
        Self { extractor, web }
    }

    async fn download_image(&self, page: &Url) -> Result<MediaDownload, MediaError> {
        let image = self
            .web
            .og_image(page)
            .await?
            .ok_or(MediaError::MediaNotFound)?;

        info!(%image, "Falling back to the post's Open Graph image");

        let upstream = self.web.open(&image).await?;

        Ok(MediaDownload {
            content_type: "image/jpeg".to_string(),
            file_name: time_file_name("insta_image", "jpg"),
            body: upstream.body,
        })
    }
}

#[async_trait::async_trait]
impl PlatformHandler for InstagramHandler {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn fetch_info(&self, request: &MediaRequest) -> Result<MediaInfo, MediaError> {
        let url = clean_url(&request.url);

        match self.extractor.fetch_info(&url, None).await {
            Ok(info) => Ok(info.into()),
            Err(e) => {
                debug!(?e, %url, "Instagram info unavailable, using placeholder");
                Ok(MediaInfo::instagram_placeholder())
            }
        }
    }

    async fn stream_download(&self, request: &MediaRequest) -> Result<MediaDownload, MediaError> {
        let url = clean_url(&request.url);

        let info = match self.extractor.fetch_info(&url, None).await {
            Ok(info) if info.has_usable_stream() => Some(info),
            Ok(_) => {
                debug!(%url, "Instagram post has no video formats");
                None
            }
            Err(e) => {
                warn!(?e, %url, "Instagram extraction failed");
                None
            }
        };

        if let Some(info) = info {
            let file_name = info
                .title
                .as_deref()
                .map(|x| sanitize_file_name(x, MAX_TITLE_LENGTH))
                .filter(|x| !x.is_empty())
                .map_or_else(
                    || time_file_name("insta_video", "mp4"),
                    |x| format!("{x}.mp4"),
                );

            let stream = self
                .extractor
                .stream(StreamRequest::new(url.clone(), BEST_SINGLE_FILE).with_user_agent())
                .await;

            match stream {
                Ok(body) => {
                    return Ok(MediaDownload {
                        content_type: VIDEO_CONTENT_TYPE.to_string(),
                        file_name,
                        body,
                    });
                }
                Err(MediaError::ExtractionFailed(reason)) => {
                    warn!(%reason, %url, "Instagram stream failed");
                }
                Err(e) => return Err(e),
            }
        }

        self.download_image(&url).await
    }
}
