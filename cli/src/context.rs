//! Per-invocation context: settings, API client, live channels and the
//! application linked to the current repository

use std::path::Path;

use secrecy::SecretString;
use tracing::debug;

use crate::cli::Cli;
use crate::config::layout::ConfigLayout;
use crate::config::linked_apps::{LinkedApp, LinkedApps};
use crate::config::settings::Settings;
use crate::errors::CliError;
use crate::git::GitRepo;
use crate::http::HttpClient;
use crate::stream::StreamFactory;
use crate::watch::orchestrator::WatchOptions;

/// Configuration layout selected on the command line
pub fn config_layout(cli: &Cli) -> ConfigLayout {
    match &cli.config_dir {
        Some(dir) => ConfigLayout::new(dir),
        None => ConfigLayout::default(),
    }
}

/// Read the settings file, missing file yields defaults
pub async fn load_settings(layout: &ConfigLayout) -> Result<Settings, CliError> {
    let file = layout.settings_file();
    debug!("Reading settings from {}", file.path().display());
    let settings: Settings = file.read_json_or_default().await?;
    settings.validate()?;
    Ok(settings)
}

/// Everything a command needs to talk to the platform
pub struct Context {
    pub settings: Settings,
    pub api: HttpClient,
    pub streams: StreamFactory,
}

impl Context {
    /// Build the context, command line flags overriding the settings file
    pub fn new(cli: &Cli, mut settings: Settings) -> Result<Self, CliError> {
        if let Some(api_host) = &cli.api_host {
            settings.api_host = api_host.clone();
        }
        let token = match &cli.token {
            Some(token) => SecretString::from(token.clone()),
            None => settings.token.clone().ok_or_else(|| {
                CliError::ConfigError(
                    "No API token found. Set CLEVER_TOKEN or add a token to the settings file"
                        .to_string(),
                )
            })?,
        };

        let api = HttpClient::new(&settings.api_host, token.clone())?;
        let streams = StreamFactory::new(&settings.api_host, token)?;

        Ok(Self {
            settings,
            api,
            streams,
        })
    }

    /// Watch options of a deployment command
    pub fn watch_options(&self, quiet: bool, follow: bool) -> WatchOptions {
        WatchOptions {
            quiet,
            follow,
            poller: self.settings.watch.poller_options(),
            relay: self.settings.watch.relay_options(),
        }
    }
}

/// Find the repository containing `start` and the application it targets
pub async fn linked_app(start: &Path, alias: Option<&str>) -> Result<(GitRepo, LinkedApp), CliError> {
    let repo = GitRepo::discover(start)?;
    let file = ConfigLayout::linked_apps_file(repo.dir());
    let linked: LinkedApps = file.read_json_or_default().await?;
    let app = linked.resolve(alias)?.clone();

    debug!("Targeting application {} ({})", app.name, app.app_id);
    Ok((repo, app))
}
