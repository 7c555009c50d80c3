use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEPLOYMENT_ACTION_BEGIN: &str = "DEPLOYMENT_ACTION_BEGIN";
pub const DEPLOYMENT_ACTION_END: &str = "DEPLOYMENT_ACTION_END";

/// Event pushed on the application event socket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    pub event: String,

    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub data: EventData,
}

impl PlatformEvent {
    /// Whether the event marks the beginning or the end of a deployment action
    pub fn is_deployment_action(&self) -> bool {
        self.event == DEPLOYMENT_ACTION_BEGIN || self.event == DEPLOYMENT_ACTION_END
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub cause: Option<String>,
}
