use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, ValueEnum, ValueHint};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{cli::CliArgs, APPLICATION_NAME};

const YT_DLP_BINARY: &str = "yt-dlp";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Args, Validate)]
#[clap(next_help_heading = Some("Program paths"))]
pub struct ProgramPathConfig {
    /// Path to the yt-dlp executable.
    ///
    /// If not provided, yt-dlp will be searched for in $PATH
    /// and then next to the working directory.
    #[arg(long, default_value = None, env = "YT_DLP_PATH", value_hint = ValueHint::FilePath, value_parser = validate_valid_path())]
    yt_dlp_path: Option<PathBuf>,
}
impl ProgramPathConfig {
    #[must_use]
    pub fn with_yt_dlp_path<T: Into<PathBuf>>(path: T) -> Self {
        Self {
            yt_dlp_path: Some(path.into()),
        }
    }

    #[must_use]
    pub fn yt_dlp_path(&self) -> &Path {
        self.yt_dlp_path
            .as_deref()
            .unwrap_or_else(|| Path::new(YT_DLP_BINARY))
    }

    #[must_use]
    pub fn resolve_paths(mut self) -> Self {
        self.with_resolved_paths();
        self
    }

    pub fn with_resolved_paths(&mut self) -> &Self {
        self.yt_dlp_path = self
            .yt_dlp_path
            .clone()
            .or_else(|| which::which(YT_DLP_BINARY).ok())
            .or_else(local_yt_dlp);

        self
    }
}

/// A `yt-dlp` binary dropped next to where the server was started
fn local_yt_dlp() -> Option<PathBuf> {
    ["yt-dlp.exe", YT_DLP_BINARY]
        .into_iter()
        .map(PathBuf::from)
        .find(|x| x.is_file())
}

#[derive(Debug, Clone, Serialize, Deserialize, ValueEnum)]
pub enum DumpConfigType {
    Json,
    Toml,
}
#[derive(Debug, Clone, Default, Serialize, Deserialize, Args, Validate)]
#[allow(clippy::option_option)]
#[clap(next_help_heading = Some("Run options"))]
pub struct RunConfig {
    /// Dump the config to stdout
    #[arg(long, value_enum, default_value = None)]
    pub dump_config: Option<Option<DumpConfigType>>,

    /// Dump shell completions to stdout
    #[arg(long, default_value = None, value_name = "SHELL", value_parser = hacky_dump_completions())]
    #[serde(skip)]
    pub dump_completions: Option<Shell>,
}

#[must_use]
pub fn validate_valid_path() -> impl clap::builder::TypedValueParser {
    move |s: &str| {
        let path = Path::new(s);
        if !path.exists() {
            return Err("File does not exist");
        }

        Ok(path.to_path_buf())
    }
}

#[must_use]
pub fn validate_valid_directory() -> impl clap::builder::TypedValueParser {
    move |s: &str| {
        let path = Path::new(s);
        if !path.is_dir() {
            return Err("Directory does not exist");
        }

        Ok(path.to_path_buf())
    }
}

pub fn valid_directory(path: &Path) -> Result<(), ValidationError> {
    if !path.exists() {
        return Err(ValidationError::new("Directory does not exist"));
    }

    if !path.is_dir() {
        return Err(ValidationError::new("Path is not a directory"));
    }

    Ok(())
}

#[must_use]
pub fn hacky_dump_completions() -> impl clap::builder::TypedValueParser {
    move |s: &str| {
        let parsed = Shell::from_str(s, true);

        if let Ok(shell) = &parsed {
            clap_complete::generate(
                *shell,
                &mut CliArgs::command(),
                APPLICATION_NAME,
                &mut std::io::stdout(),
            );
            std::process::exit(0);
        }

        parsed.map_err(|_| ValidationError::new("Invalid shell"))
    }
}
