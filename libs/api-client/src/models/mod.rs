//! API models

mod application;
mod deployment;
mod event;
mod log;

pub use application::{Application, RedeployResponse};
pub use deployment::{Deployment, DeploymentState};
pub use event::{EventData, PlatformEvent, DEPLOYMENT_ACTION_BEGIN, DEPLOYMENT_ACTION_END};
pub use log::{LogLine, LogSource};

use serde::{Deserialize, Serialize};

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub id: Option<u32>,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}
