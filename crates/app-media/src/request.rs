use url::Url;

use crate::{
    classify::{classify_url, validate_url, Platform, PlatformClassification},
    error::MediaError,
    quality::Quality,
};

/// Everything a handler needs to know about one incoming request
#[derive(Debug, Clone)]
pub struct MediaRequest {
    pub url: Url,
    pub classification: PlatformClassification,
    pub quality: Quality,
}
impl MediaRequest {
    /// Validate raw query parameters.
    ///
    /// Fails before anything is spawned or fetched.
    pub fn parse(url: Option<&str>, quality: Option<&str>) -> Result<Self, MediaError> {
        let url = url
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .ok_or(MediaError::MissingParameter)?;
        let url = validate_url(url)?;

        Ok(Self::new(url, Quality::from_param(quality)))
    }

    #[must_use]
    pub fn new(url: Url, quality: Quality) -> Self {
        let classification = classify_url(&url);

        Self {
            url,
            classification,
            quality,
        }
    }

    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.classification.platform
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.classification.identifier.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_url() {
        assert!(matches!(
            MediaRequest::parse(None, None),
            Err(MediaError::MissingParameter)
        ));
        assert!(matches!(
            MediaRequest::parse(Some("  "), None),
            Err(MediaError::MissingParameter)
        ));
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            MediaRequest::parse(Some("file:///etc/passwd"), None),
            Err(MediaError::InvalidUrl(_))
        ));
    }

    #[test]
    fn classifies_and_defaults_quality() {
        let req = MediaRequest::parse(Some("https://youtu.be/abc123"), Some("4k"))
            .expect("valid request");

        assert_eq!(req.platform(), Platform::YouTube);
        assert_eq!(req.identifier(), Some("abc123"));
        assert_eq!(req.quality, Quality::P720);
    }
}
