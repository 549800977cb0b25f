use std::sync::Arc;

use app_helpers::{file_name::file_name_from_url_path, id::time_name};
use tracing::debug;

use super::{MediaDownload, PlatformHandler};
use crate::{
    classify::Platform,
    error::MediaError,
    extractor::MediaExtractor,
    info::MediaInfo,
    request::MediaRequest,
    web::WebFetcher,
};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub struct GenericHandler {
    extractor: Arc<dyn MediaExtractor>,
    web: Arc<dyn WebFetcher>,
}
impl GenericHandler {
    pub fn new(extractor: Arc<dyn MediaExtractor>, web: Arc<dyn WebFetcher>) -> Self {
        Self { extractor, web }
    }
}

#[async_trait::async_trait]
impl PlatformHandler for GenericHandler {
    fn platform(&self) -> Platform {
        Platform::Generic
    }

    async fn fetch_info(&self, request: &MediaRequest) -> Result<MediaInfo, MediaError> {
        self.extractor
            .fetch_info(&request.url, None)
            .await
            .map(MediaInfo::from)
    }

    async fn stream_download(&self, request: &MediaRequest) -> Result<MediaDownload, MediaError> {
        let upstream = self.web.open(&request.url).await?;

        let file_name =
            file_name_from_url_path(request.url.path()).unwrap_or_else(|| time_name("download"));
        let content_type = upstream
            .content_type
            .filter(|x| !x.is_empty())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        debug!(%file_name, %content_type, "Proxying direct download");

        Ok(MediaDownload {
            content_type,
            file_name,
            body: upstream.body,
        })
    }
}
