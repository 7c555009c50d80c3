use serde::{Deserialize, Serialize};

/// Application summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub name: String,

    /// Commit currently deployed, absent for a brand new application
    #[serde(default)]
    pub commit_id: Option<String>,
}

/// Response of a redeploy request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeployResponse {
    pub deployment_id: String,
}
