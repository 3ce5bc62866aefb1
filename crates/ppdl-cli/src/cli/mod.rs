//! CLI for ppdl, the Immich person photo downloader.

mod commands;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use ppdl_core::config::{ConfigLayer, Settings};
use std::path::PathBuf;
use uuid::Uuid;

use commands::{run_fetch, run_list};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ppdl")]
#[command(about = "Download every photo of one person from an Immich server", long_about = None)]
pub struct Cli {
    /// Debug logging for ppdl itself (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Append logs to $XDG_STATE_HOME/ppdl/ppdl.log instead of stderr.
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the person's photos into <save-to>/YYYY/MM/DD/.
    Fetch {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the paths that would be written; download nothing.
        #[arg(long, env = "DRY")]
        dry: bool,
    },

    /// Print `<asset id>\t<destination>` for every matching photo.
    List {
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Server, person and destination options shared by all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Immich API base URL, e.g. https://photos.example.org/api.
    #[arg(long, env = "IMMICH_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// API key with asset.read and asset.download permissions.
    #[arg(long, env = "IMMICH_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Person to download.
    #[arg(long, env = "PERSON_ID", value_name = "UUID")]
    pub person_id: Option<Uuid>,

    /// Only photos uploaded after this RFC 3339 timestamp.
    #[arg(long, env = "AFTER", value_name = "TIME", conflicts_with = "last_days")]
    pub after: Option<DateTime<Utc>>,

    /// Only photos uploaded in the last N days.
    #[arg(long, env = "LAST_DAYS", value_name = "N")]
    pub last_days: Option<u32>,

    /// Root directory for downloads (default: current directory).
    #[arg(long, env = "SAVE_TO", value_name = "DIR")]
    pub save_to: Option<PathBuf>,

    /// Number of concurrent downloads (default 4).
    #[arg(long, env = "THREADS", value_name = "N")]
    pub threads: Option<usize>,

    /// Config file (default: $XDG_CONFIG_HOME/ppdl/config.toml if present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl TargetArgs {
    /// Settings given on the command line or in the environment.
    pub fn layer(&self, dry: Option<bool>) -> ConfigLayer {
        ConfigLayer {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            person_id: self.person_id,
            after: self.after,
            last_days: self.last_days,
            save_to: self.save_to.clone(),
            threads: self.threads,
            dry,
        }
    }

    /// Merge with the credentials directory and the config file, then validate.
    pub fn settings(&self, dry: Option<bool>) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => ConfigLayer::load_file(path)?,
            None => ConfigLayer::load_default().context("failed to load default config")?,
        };
        let credentials = ConfigLayer::from_credentials_env()?;
        let layer = self.layer(dry).merge(credentials).merge(file);
        let settings = Settings::resolve(layer, Utc::now()).context("invalid configuration")?;
        tracing::debug!("resolved settings: {:?}", settings);
        Ok(settings)
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Fetch { target, dry } => {
                // An unset flag leaves `dry` to the config file.
                let settings = target.settings(dry.then_some(true))?;
                run_fetch(&settings)?;
            }
            CliCommand::List { target } => {
                let settings = target.settings(None)?;
                run_list(&settings)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
