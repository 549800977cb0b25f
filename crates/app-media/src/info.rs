use serde::{de::IgnoredAny, Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    YouTube,
    Video,
    Photo,
    Instagram,
}

/// What the UI needs to render a preview card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub title: String,
    pub thumbnail: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}
impl MediaInfo {
    /// Built from the video id alone, without asking yt-dlp
    #[must_use]
    pub fn youtube(video_id: &str) -> Self {
        Self {
            title: "YouTube Video".to_string(),
            thumbnail: Some(format!(
                "https://img.youtube.com/vi/{video_id}/maxresdefault.jpg"
            )),
            kind: MediaKind::YouTube,
            duration: None,
            stream_url: None,
            video_id: Some(video_id.to_string()),
        }
    }

    /// Returned when Instagram refuses to tell us anything
    #[must_use]
    pub fn instagram_placeholder() -> Self {
        Self {
            title: "Instagram Post".to_string(),
            thumbnail: None,
            kind: MediaKind::Instagram,
            duration: None,
            stream_url: None,
            video_id: None,
        }
    }
}

impl From<ExtractorInfo> for MediaInfo {
    fn from(info: ExtractorInfo) -> Self {
        let thumbnail = info.thumbnail.clone().or_else(|| {
            info.thumbnails
                .as_ref()
                .and_then(|x| x.iter().find_map(|t| t.url.clone()))
        });

        Self {
            title: info
                .title
                .filter(|x| !x.trim().is_empty())
                .unwrap_or_else(|| "Untitled Media".to_string()),
            thumbnail,
            kind: if info.url.is_some() {
                MediaKind::Video
            } else {
                MediaKind::Photo
            },
            duration: info.duration_string,
            stream_url: info.url,
            video_id: None,
        }
    }
}

/// The part of `yt-dlp -j` output we care about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub ext: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub thumbnails: Option<Vec<ExtractorThumbnail>>,
    pub duration_string: Option<String>,
    pub formats: Option<Vec<IgnoredAny>>,
}
impl ExtractorInfo {
    /// yt-dlp found something it can stream
    #[must_use]
    pub fn has_usable_stream(&self) -> bool {
        self.url.is_some() || self.formats.as_ref().is_some_and(|x| !x.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorThumbnail {
    pub url: Option<String>,
}
