use std::io;

use bytes::Bytes;
use futures::stream::BoxStream;
use url::Url;

pub use self::{process_stream::ProcessStream, yt_dlp::YtDlp};
use crate::{error::MediaError, info::ExtractorInfo};

mod process_stream;
mod yt_dlp;

/// Media bytes on their way to the client
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub url: Url,
    pub format: String,
    pub send_user_agent: bool,
}
impl StreamRequest {
    #[must_use]
    pub fn new<T: Into<String>>(url: Url, format: T) -> Self {
        Self {
            url,
            format: format.into(),
            send_user_agent: false,
        }
    }

    #[must_use]
    pub const fn with_user_agent(mut self) -> Self {
        self.send_user_agent = true;
        self
    }
}

/// The external tool that turns a page URL into metadata and media bytes
#[async_trait::async_trait]
pub trait MediaExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Metadata for `url`, resolved against `format` when one is given
    async fn fetch_info(&self, url: &Url, format: Option<&str>)
        -> Result<ExtractorInfo, MediaError>;

    /// Start streaming media bytes.
    ///
    /// Implementations resolve only once the first bytes are available, so a
    /// tool that dies immediately surfaces as an error instead of an empty body.
    async fn stream(&self, request: StreamRequest) -> Result<ByteStream, MediaError>;
}
