use std::path::PathBuf;

use clap::{Args, ValueHint};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::{valid_directory, validate_valid_directory};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Args, Validate)]
#[clap(next_help_heading = "Server options")]
pub struct ServerConfig {
    /// The port on which the server will listen.
    #[arg(long, default_value = "4000", env = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// How many consecutive ports to try when the requested one is taken.
    #[arg(long, default_value = "10", env = "MEDIA_RELAY_PORT_ATTEMPTS")]
    #[validate(range(min = 1, max = 1000))]
    pub port_attempts: u16,

    /// The host on which the server will listen.
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Directory with the pre-built web UI.
    /// Served at `/` when set.
    #[arg(long, default_value = None, env = "MEDIA_RELAY_PUBLIC_DIR", value_hint = ValueHint::DirPath, value_parser = validate_valid_directory())]
    #[validate(custom(function = "valid_directory"))]
    pub public_dir: Option<PathBuf>,
}
