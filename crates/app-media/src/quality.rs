use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Single pre-muxed file, the safest thing to pipe into a browser
pub const BEST_SINGLE_FILE: &str = "best";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "360")]
    P360,
    #[serde(rename = "480")]
    P480,
    #[default]
    #[serde(rename = "720")]
    P720,
    #[serde(rename = "1080")]
    P1080,
    #[serde(rename = "best")]
    Best,
}

impl Quality {
    pub const ALL: [Self; 5] = [Self::P360, Self::P480, Self::P720, Self::P1080, Self::Best];

    /// Read the `quality` query parameter.
    ///
    /// Missing or unrecognized values fall back to [`Quality::P720`].
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::parse::<Self>) {
            Some(Ok(q)) => q,
            Some(Err(e)) => {
                debug!(?e, "Falling back to default quality");
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// yt-dlp `-f` selector for this quality
    #[must_use]
    pub const fn format_selector(self) -> &'static str {
        match self {
            Self::P360 => "18/bestvideo[height<=360]+bestaudio/best[height<=360]/best",
            Self::P480 => "bestvideo[height<=480]+bestaudio/best[height<=480]/best",
            Self::P720 => "22/bestvideo[height<=720]+bestaudio/best[height<=720]/best",
            Self::P1080 => "bestvideo[height<=1080]+bestaudio/best[height<=1080]/best",
            Self::Best => "bestvideo+bestaudio/best",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P360 => "360",
            Self::P480 => "480",
            Self::P720 => "720",
            Self::P1080 => "1080",
            Self::Best => "best",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown quality {0:?}")]
pub struct UnknownQuality(pub String);

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_suffix(['p', 'P'])
            .filter(|x| !x.is_empty() && x.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(s);

        Self::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownQuality(s.to_string()))
    }
}
