//! Awaiting the end of a located deployment

use std::future::Future;
use std::time::Duration;

use api_client::models::Deployment;
use tracing::debug;

use crate::errors::CliError;
use crate::watch::poller::{wait_for, PollerOptions};
use crate::watch::{AppTarget, DeploymentApi};

/// Poll the deployment until it leaves the WIP state.
///
/// The terminal state is returned as is; interpreting OK, FAIL or CANCELLED
/// is up to the caller.
pub async fn wait_for_deployment_end<A, S, SF>(
    api: &A,
    app: &AppTarget,
    deployment_id: &str,
    options: &PollerOptions,
    sleep_fn: &S,
) -> Result<Deployment, CliError>
where
    A: DeploymentApi + ?Sized,
    S: Fn(Duration) -> SF,
    SF: Future<Output = ()>,
{
    wait_for(options, sleep_fn, move || async move {
        let deployment = api
            .get_deployment(app, deployment_id)
            .await
            .inspect_err(|_| debug!("Failed to retrieve current deployment status"))?;

        if deployment.state.is_terminal() {
            debug!("Deployment is finished (state:{})", deployment.state);
            Ok(Some(deployment))
        } else {
            debug!("Deployment is not finished yet (state:{})", deployment.state);
            Ok(None)
        }
    })
    .await
}
