//! Settings file management

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::errors::CliError;
use crate::logs::LogLevel;
use crate::watch::poller::PollerOptions;
use crate::watch::relay::RelayOptions;

/// CLI settings
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Base URL of the platform API
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// API token, usually provided through CLEVER_TOKEN instead
    #[serde(default, deserialize_with = "deserialize_token")]
    pub token: Option<SecretString>,

    /// Deployment watch tunables
    #[serde(default)]
    pub watch: WatchSettings,
}

fn deserialize_token<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn default_api_host() -> String {
    "https://api.clever-cloud.com".to_string()
}

impl Settings {
    /// Reject values the watchers cannot work with
    pub fn validate(&self) -> Result<(), CliError> {
        self.watch.validate()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            api_host: default_api_host(),
            token: None,
            watch: WatchSettings::default(),
        }
    }
}

/// Polling and streaming settings used while watching a deployment
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSettings {
    /// Delay between two polls when the awaited state is not reached yet
    #[serde(default = "default_polling_delay_ms")]
    pub polling_delay_ms: u64,

    /// Base delay of the backoff applied after a network failure
    #[serde(default = "default_init_retry_timeout_ms")]
    pub init_retry_timeout_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Consecutive network failures tolerated by the poller
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,

    /// Consecutive reconnections tolerated by live streams
    #[serde(default = "default_stream_max_retry_count")]
    pub stream_max_retry_count: u32,

    #[serde(default = "default_stream_reconnect_delay_ms")]
    pub stream_reconnect_delay_ms: u64,
}

fn default_polling_delay_ms() -> u64 {
    5000
}

fn default_init_retry_timeout_ms() -> u64 {
    1500
}

fn default_backoff_factor() -> f64 {
    1.25
}

fn default_max_retry_count() -> u32 {
    5
}

fn default_stream_max_retry_count() -> u32 {
    6
}

fn default_stream_reconnect_delay_ms() -> u64 {
    1000
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            polling_delay_ms: default_polling_delay_ms(),
            init_retry_timeout_ms: default_init_retry_timeout_ms(),
            backoff_factor: default_backoff_factor(),
            max_retry_count: default_max_retry_count(),
            stream_max_retry_count: default_stream_max_retry_count(),
            stream_reconnect_delay_ms: default_stream_reconnect_delay_ms(),
        }
    }
}

impl WatchSettings {
    pub fn validate(&self) -> Result<(), CliError> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(CliError::ConfigError(format!(
                "watch.backoff_factor must be a number >= 1, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    pub fn poller_options(&self) -> PollerOptions {
        PollerOptions {
            polling_delay: Duration::from_millis(self.polling_delay_ms),
            init_retry_timeout: Duration::from_millis(self.init_retry_timeout_ms),
            backoff_factor: self.backoff_factor,
            max_retry_count: self.max_retry_count,
        }
    }

    pub fn relay_options(&self) -> RelayOptions {
        RelayOptions {
            auto_retry: true,
            max_retry_count: self.stream_max_retry_count,
            reconnect_delay: Duration::from_millis(self.stream_reconnect_delay_ms),
        }
    }
}
