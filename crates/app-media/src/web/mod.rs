use std::{io, time::Duration};

use app_config::Config;
use futures::{StreamExt, TryStreamExt};
use reqwest::header;
use tracing::{debug, trace, warn};
use url::Url;

use crate::{error::MediaError, extractor::ByteStream};

mod og_image;

pub use og_image::find_og_image;

/// A response body from a third-party server
pub struct UpstreamBody {
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl std::fmt::Debug for UpstreamBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamBody")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Plain HTTP access to third-party sites
#[async_trait::async_trait]
pub trait WebFetcher: Send + Sync {
    /// The Open Graph image of an HTML page, if it has one
    async fn og_image(&self, page: &Url) -> Result<Option<Url>, MediaError>;

    /// GET a URL and hand back its body as a stream
    async fn open(&self, url: &Url) -> Result<UpstreamBody, MediaError>;
}

#[derive(Debug, Clone)]
pub struct WebClient {
    client: reqwest::Client,
    page_timeout: Duration,
}

impl WebClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                MediaError::UpstreamConnectionFailed(format!("Failed to create client: {e:?}"))
            })?;

        Ok(Self {
            client,
            page_timeout: timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, MediaError> {
        let extractor = config.extractor();

        Self::new(&extractor.user_agent, extractor.upstream_timeout())
    }
}

#[async_trait::async_trait]
impl WebFetcher for WebClient {
    async fn og_image(&self, page: &Url) -> Result<Option<Url>, MediaError> {
        debug!(%page, "Scraping page for og:image");

        let body = self
            .client
            .get(page.as_str())
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(|e| upstream_error("Failed to fetch page", &e))?
            .text()
            .await
            .map_err(|e| upstream_error("Failed to read page", &e))?;

        let found = find_og_image(&body).and_then(|x| page.join(&x).ok());
        trace!(?found, "og:image lookup finished");

        Ok(found)
    }

    async fn open(&self, url: &Url) -> Result<UpstreamBody, MediaError> {
        debug!(%url, "Opening upstream");

        let res = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| upstream_error("Request failed", &e))?;

        let status = res.status();
        if !status.is_success() {
            warn!(%url, %status, "Upstream answered with an error");
            return Err(MediaError::UpstreamConnectionFailed(format!(
                "Upstream answered with {status}"
            )));
        }

        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|x| x.to_str().ok())
            .map(ToString::to_string);

        // Dropping the stream drops the connection with it
        let body = res.bytes_stream().map_err(io::Error::other).boxed();

        Ok(UpstreamBody { content_type, body })
    }
}

fn upstream_error(what: &str, e: &reqwest::Error) -> MediaError {
    warn!(?e, "{what}");

    MediaError::UpstreamConnectionFailed(format!("{what}: {e}"))
}
