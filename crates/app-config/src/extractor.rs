use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/122.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Args, Validate)]
#[clap(next_help_heading = "Extractor options")]
pub struct ExtractorConfig {
    /// User agent sent to media sites, both by yt-dlp and by direct fetches.
    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "MEDIA_RELAY_USER_AGENT")]
    #[validate(length(min = 1))]
    pub user_agent: String,

    /// Maximum time a yt-dlp metadata lookup may take, in seconds.
    #[arg(long, default_value = "15", env = "MEDIA_RELAY_INFO_TIMEOUT")]
    #[validate(range(min = 1, max = 600))]
    pub info_timeout_secs: u64,

    /// Maximum number of yt-dlp processes running at the same time.
    #[arg(long, default_value = "16", env = "MEDIA_RELAY_MAX_PROCESSES")]
    #[validate(range(min = 1, max = 4096))]
    pub max_processes: usize,

    /// Connect timeout for direct fetches and page scrapes, in seconds.
    #[arg(long, default_value = "30", env = "MEDIA_RELAY_UPSTREAM_TIMEOUT")]
    #[validate(range(min = 1, max = 600))]
    pub upstream_timeout_secs: u64,
}
impl ExtractorConfig {
    #[must_use]
    pub const fn info_timeout(&self) -> Duration {
        Duration::from_secs(self.info_timeout_secs)
    }

    #[must_use]
    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
