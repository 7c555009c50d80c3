use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deployment state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeploymentState {
    /// Work in progress, the only non-terminal state
    Wip,
    Ok,
    Fail,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl DeploymentState {
    /// Anything but WIP means the deployment has ended
    pub fn is_terminal(&self) -> bool {
        *self != DeploymentState::Wip
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentState::Wip => "WIP",
            DeploymentState::Ok => "OK",
            DeploymentState::Fail => "FAIL",
            DeploymentState::Cancelled => "CANCELLED",
            DeploymentState::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build/deploy attempt of an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(rename = "uuid")]
    pub id: String,

    #[serde(rename = "commit", default)]
    pub commit_id: Option<String>,

    pub state: DeploymentState,

    /// DEPLOY, UNDEPLOY, RESTART...
    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub cause: Option<String>,

    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date: Option<DateTime<Utc>>,
}

impl Deployment {
    pub fn new(id: impl Into<String>, commit_id: Option<&str>, state: DeploymentState) -> Self {
        Self {
            id: id.into(),
            commit_id: commit_id.map(str::to_string),
            state,
            action: None,
            cause: None,
            date: None,
        }
    }
}
