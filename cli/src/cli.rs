//! Command line definition

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::logs::LogLevel;

/// Deploy and monitor applications on Clever Cloud
#[derive(Debug, Parser)]
#[command(name = "clever")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the platform API
    #[arg(long, global = true, env = "CLEVER_API_HOST")]
    pub api_host: Option<String>,

    /// API token
    #[arg(long, global = true, env = "CLEVER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Configuration directory
    #[arg(long, global = true, env = "CLEVER_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Diagnostics level, overrides the settings file
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Shortcut for --log-level debug
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write diagnostics as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Deploy the current branch and watch the deployment
    Deploy(DeployArgs),
    /// Redeploy an application and watch the deployment
    Restart(RestartArgs),
    /// Display application or add-on logs
    Logs(LogsArgs),
    /// Show the deployment activity of an application
    Activity(ActivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Short name of the linked application
    #[arg(short, long)]
    pub alias: Option<String>,

    /// Branch to push, the current branch by default
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Do not display the deployment logs
    #[arg(short, long)]
    pub quiet: bool,

    /// Force the push even if it is not a fast-forward
    #[arg(short, long)]
    pub force: bool,

    /// Keep displaying logs once the deployment has ended
    #[arg(long, conflicts_with = "quiet")]
    pub follow: bool,
}

#[derive(Debug, Args)]
pub struct RestartArgs {
    /// Short name of the linked application
    #[arg(short, long)]
    pub alias: Option<String>,

    /// Commit to redeploy, the currently deployed one by default
    #[arg(long)]
    pub commit: Option<String>,

    /// Rebuild from scratch
    #[arg(long)]
    pub without_cache: bool,

    /// Do not display the deployment logs
    #[arg(short, long)]
    pub quiet: bool,

    /// Keep displaying logs once the deployment has ended
    #[arg(long, conflicts_with = "quiet")]
    pub follow: bool,
}

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Short name of the linked application
    #[arg(short, long)]
    pub alias: Option<String>,

    /// Only logs after this date (RFC 3339)
    #[arg(long, visible_alias = "after")]
    pub since: Option<DateTime<Utc>>,

    /// Only logs before this date (RFC 3339)
    #[arg(long, visible_alias = "until")]
    pub before: Option<DateTime<Utc>>,

    /// Only logs containing this text
    #[arg(long)]
    pub search: Option<String>,

    /// Only logs of this deployment
    #[arg(long)]
    pub deployment_id: Option<String>,

    /// Add-on to display the logs of, instead of the application
    #[arg(long, conflicts_with = "alias")]
    pub addon: Option<String>,
}

#[derive(Debug, Args)]
pub struct ActivityArgs {
    /// Short name of the linked application
    #[arg(short, long)]
    pub alias: Option<String>,

    /// Show every past deployment
    #[arg(long)]
    pub show_all: bool,

    /// Keep displaying new deployment events
    #[arg(short, long)]
    pub follow: bool,
}

impl Cli {
    /// Diagnostics level requested on the command line
    pub fn requested_log_level(&self) -> Option<LogLevel> {
        if self.verbose {
            Some(LogLevel::Debug)
        } else {
            self.log_level
        }
    }
}
