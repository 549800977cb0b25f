use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};

use crate::{common, extractor, server};

/// Preview, live-stream or download media from YouTube, Instagram
/// and direct file links through a single HTTP endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[clap(disable_help_flag = true)]
pub struct CliArgs {
    /// Print help
    #[clap(action = ArgAction::Help, long)]
    help: Option<bool>,

    #[command(flatten)]
    pub dependency_path: common::ProgramPathConfig,

    #[command(flatten)]
    pub run: common::RunConfig,

    #[command(flatten)]
    pub server: server::ServerConfig,

    #[command(flatten)]
    pub extractor: extractor::ExtractorConfig,
}
