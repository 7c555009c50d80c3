//! Locating the deployment created by a push or a redeploy

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use api_client::models::Deployment;
use tracing::{debug, warn};

use crate::errors::CliError;
use crate::watch::poller::{wait_for, PollerOptions};
use crate::watch::{AppTarget, DeploymentApi};

/// Number of recent deployments inspected on each attempt
pub const RECENT_DEPLOYMENTS_LIMIT: u32 = 5;

/// What identifies the deployment we are waiting for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentQuery {
    /// Redeploy: the platform already gave us the deployment id
    ById(String),

    /// Push: the new deployment runs the pushed commit and was not known
    /// before the push
    NewForCommit {
        commit_id: String,
        known_ids: HashSet<String>,
    },
}

impl DeploymentQuery {
    /// Build a commit query from the deployments listed before the push
    pub fn new_for_commit(commit_id: impl Into<String>, known_deployments: &[Deployment]) -> Self {
        DeploymentQuery::NewForCommit {
            commit_id: commit_id.into(),
            known_ids: known_deployments.iter().map(|d| d.id.clone()).collect(),
        }
    }

    pub fn matches(&self, deployment: &Deployment) -> bool {
        match self {
            DeploymentQuery::ById(id) => deployment.id == *id,
            DeploymentQuery::NewForCommit {
                commit_id,
                known_ids,
            } => {
                deployment.commit_id.as_deref() == Some(commit_id.as_str())
                    && !known_ids.contains(&deployment.id)
            }
        }
    }
}

/// First deployment matching the query, in the order returned by the API
pub fn find_deployment<'a>(
    deployments: &'a [Deployment],
    query: &DeploymentQuery,
) -> Option<&'a Deployment> {
    let mut candidates = deployments.iter().filter(|d| query.matches(d));
    let found = candidates.next();
    if found.is_some() && candidates.next().is_some() {
        warn!("Several new deployments match {:?}, picking the most recent one", query);
    }
    found
}

/// Poll the recent deployments until the queried one shows up.
///
/// Fetching a deployment by id right after a redeploy can fail, so both
/// modes go through the list of recent deployments.
pub async fn wait_for_deployment_start<A, S, SF>(
    api: &A,
    app: &AppTarget,
    query: &DeploymentQuery,
    options: &PollerOptions,
    sleep_fn: &S,
) -> Result<Deployment, CliError>
where
    A: DeploymentApi + ?Sized,
    S: Fn(Duration) -> SF,
    SF: Future<Output = ()>,
{
    wait_for(options, sleep_fn, move || async move {
        let deployments = api
            .list_deployments(app, Some(RECENT_DEPLOYMENTS_LIMIT))
            .await
            .inspect_err(|_| debug!("Failed to retrieve deployments"))?;

        match find_deployment(&deployments, query) {
            Some(deployment) => {
                debug!("Deployment has started (state:{})", deployment.state);
                Ok(Some(deployment.clone()))
            }
            None => {
                debug!("Deployment cannot be found yet");
                Ok(None)
            }
        }
    })
    .await
}
