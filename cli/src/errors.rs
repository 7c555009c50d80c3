//! Error types for the Clever CLI

use thiserror::Error;

/// Main error type for the Clever CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(reqwest::Error),

    /// Connection level failure (DNS resolution, refused connection, timeout)
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed {0} times!")]
    RetriesExhausted(u32),

    #[error("Push rejected because it was not a simple fast-forward. Use \"--force\" to override.")]
    PushRejected,

    #[error("Failed to push your source code because your repository is shallow and therefore cannot be pushed to the Clever remote.")]
    ShallowRepository,

    #[error("Git error: {0}")]
    GitError(String),

    #[error("Deployment was cancelled. Please check the activity")]
    DeploymentCancelled,

    #[error("Deployment failed. Please check the logs")]
    DeploymentFailed,

    #[error("Log stream failed: {0}")]
    LogStreamError(Box<CliError>),

    #[error("The {stream} stream could not be reopened after {attempts} attempts")]
    StreamExhausted { stream: String, attempts: u32 },

    #[error("The {stream} stream was disconnected")]
    StreamDisconnected { stream: String },

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    NotLinked(String),

    #[error("{0}")]
    UpToDate(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Errors the poller swallows and retries with a backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, CliError::NetworkError(_))
    }

    /// Errors after which a live stream may be reopened
    pub fn is_reconnectable(&self) -> bool {
        match self {
            CliError::NetworkError(_)
            | CliError::StreamDisconnected { .. }
            | CliError::WebSocketError(_) => true,
            CliError::HttpError(e) => e.is_body() || e.is_decode(),
            CliError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            CliError::NetworkError(err.to_string())
        } else {
            CliError::HttpError(err)
        }
    }
}

impl From<url::ParseError> for CliError {
    fn from(err: url::ParseError) -> Self {
        CliError::ConfigError(format!("Invalid URL: {}", err))
    }
}
