//! Deployment watching: locating a new deployment, awaiting its end and
//! relaying its logs while it runs

pub mod completion;
pub mod locator;
pub mod orchestrator;
pub mod poller;
pub mod relay;

use std::sync::Arc;

use api_client::models::{Deployment, RedeployResponse};
use async_trait::async_trait;

use crate::errors::CliError;
use relay::StreamConnector;

/// Application targeted by a deployment, identified by its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTarget {
    pub owner_id: String,
    pub app_id: String,
}

impl AppTarget {
    pub fn new(owner_id: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            app_id: app_id.into(),
        }
    }
}

/// Deployment endpoints of the platform API
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Most recent deployments first
    async fn list_deployments(
        &self,
        app: &AppTarget,
        limit: Option<u32>,
    ) -> Result<Vec<Deployment>, CliError>;

    async fn get_deployment(
        &self,
        app: &AppTarget,
        deployment_id: &str,
    ) -> Result<Deployment, CliError>;

    /// Request a new deployment of an already pushed commit
    async fn redeploy(
        &self,
        app: &AppTarget,
        commit_id: Option<&str>,
        use_cache: bool,
    ) -> Result<RedeployResponse, CliError>;
}

/// Builds the live log stream of a deployment
pub trait LogStreams: Send + Sync {
    fn deployment_logs(&self, app: &AppTarget, deployment_id: &str) -> Arc<dyn StreamConnector>;
}
