use serde::Serialize;
use url::Url;

use crate::error::MediaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Instagram,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformClassification {
    pub platform: Platform,
    pub identifier: Option<String>,
}
impl PlatformClassification {
    #[must_use]
    pub const fn generic() -> Self {
        Self {
            platform: Platform::Generic,
            identifier: None,
        }
    }
}

const INSTAGRAM_POST_KINDS: [&str; 4] = ["p", "reel", "reels", "tv"];

/// Tag a URL with the platform it points to.
///
/// Anything that does not parse as a URL is [`Platform::Generic`] without an identifier.
#[must_use]
pub fn classify(url: &str) -> PlatformClassification {
    Url::parse(url.trim()).map_or_else(|_| PlatformClassification::generic(), |x| classify_url(&x))
}

#[must_use]
pub fn classify_url(url: &Url) -> PlatformClassification {
    let Some(host) = url.host_str() else {
        return PlatformClassification::generic();
    };

    if host.contains("youtube.com") || host.contains("youtu.be") {
        return PlatformClassification {
            platform: Platform::YouTube,
            identifier: youtube_id(url, host),
        };
    }

    if host.contains("instagram.com") {
        return PlatformClassification {
            platform: Platform::Instagram,
            identifier: instagram_shortcode(url),
        };
    }

    PlatformClassification::generic()
}

/// Parse a user supplied URL, accepting only `http` and `https`
pub fn validate_url(url: &str) -> Result<Url, MediaError> {
    let parsed = Url::parse(url.trim()).map_err(|e| MediaError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(MediaError::InvalidUrl(format!(
            "Unsupported scheme {:?}",
            parsed.scheme()
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(MediaError::InvalidUrl("URL has no host".to_string()));
    }

    Ok(parsed)
}

/// The URL without its query string and fragment
#[must_use]
pub fn clean_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|x| x.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn youtube_id(url: &Url, host: &str) -> Option<String> {
    let segments = path_segments(url);

    if host.contains("youtu.be") {
        if let Some(id) = segments.first() {
            return Some((*id).to_string());
        }
    }

    let from_query = url
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty());
    if from_query.is_some() {
        return from_query;
    }

    segment_after(&segments, &["shorts"])
}

fn instagram_shortcode(url: &Url) -> Option<String> {
    segment_after(&path_segments(url), &INSTAGRAM_POST_KINDS)
}

fn segment_after(segments: &[&str], markers: &[&str]) -> Option<String> {
    segments
        .windows(2)
        .find(|w| markers.contains(&w[0]))
        .map(|w| w[1].to_string())
}
