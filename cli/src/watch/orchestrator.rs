//! Deployment orchestration: trigger a deployment, locate it, relay its logs
//! and report how it ended

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use api_client::models::{Deployment, DeploymentState};
use colored::Colorize;
use tracing::{debug, info, warn};

use crate::errors::CliError;
use crate::git::SourceRemote;
use crate::output::format_log_line;
use crate::watch::completion::wait_for_deployment_end;
use crate::watch::locator::{wait_for_deployment_start, DeploymentQuery, RECENT_DEPLOYMENTS_LIMIT};
use crate::watch::poller::PollerOptions;
use crate::watch::relay::{LiveRelay, RelayOptions, RelayOutcome, StreamEnvelope};
use crate::watch::{AppTarget, DeploymentApi, LogStreams};

/// Resolves when the user asks the process to stop
pub type ShutdownSignal = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Watch options
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Do not relay the deployment logs
    pub quiet: bool,

    /// Keep relaying logs once the deployment has ended
    pub follow: bool,

    pub poller: PollerOptions,

    pub relay: RelayOptions,
}

/// What to push to the deploy remote
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub remote_url: String,
    pub refspec: String,
    pub commit_id: String,
    pub force: bool,
}

/// What to redeploy
#[derive(Debug, Clone, Default)]
pub struct RedeployRequest {
    /// Full commit id, the currently deployed commit when absent
    pub commit_id: Option<String>,
    pub use_cache: bool,
}

/// Drives a deployment from its trigger to its terminal state
pub struct DeploymentOrchestrator<'a, A: ?Sized, S> {
    api: &'a A,
    streams: &'a dyn LogStreams,
    options: WatchOptions,
    sleep_fn: S,
}

impl<'a, A, S, SF> DeploymentOrchestrator<'a, A, S>
where
    A: DeploymentApi + ?Sized,
    S: Fn(Duration) -> SF,
    SF: Future<Output = ()>,
{
    pub fn new(api: &'a A, streams: &'a dyn LogStreams, options: WatchOptions, sleep_fn: S) -> Self {
        Self {
            api,
            streams,
            options,
            sleep_fn,
        }
    }

    /// Push the source code and watch the deployment it creates
    pub async fn push_and_watch(
        &self,
        repo: &dyn SourceRemote,
        app: &AppTarget,
        push: &PushRequest,
        shutdown: &mut ShutdownSignal,
    ) -> Result<Deployment, CliError> {
        // Deployments listed before the push. A previous attempt (e.g. a
        // cancelled one) may share the commit id of the new deployment.
        let known_deployments = self
            .api
            .list_deployments(app, Some(RECENT_DEPLOYMENTS_LIMIT))
            .await?;

        println!("Pushing source code to Clever…");
        if let Err(e) = repo.push(&push.remote_url, &push.refspec, push.force).await {
            debug!("Push failed: {}", e);
            if repo.is_shallow().await {
                return Err(CliError::ShallowRepository);
            }
            return Err(e);
        }
        println!("{}", "Your source code has been pushed to Clever.".bold().green());

        let query = DeploymentQuery::new_for_commit(&push.commit_id, &known_deployments);
        self.watch(app, &query, shutdown).await
    }

    /// Request a redeploy and watch the deployment it creates
    pub async fn redeploy_and_watch(
        &self,
        app: &AppTarget,
        request: &RedeployRequest,
        shutdown: &mut ShutdownSignal,
    ) -> Result<Deployment, CliError> {
        let redeploy = self
            .api
            .redeploy(app, request.commit_id.as_deref(), request.use_cache)
            .await?;

        let query = DeploymentQuery::ById(redeploy.deployment_id);
        self.watch(app, &query, shutdown).await
    }

    /// Locate the queried deployment, relay its logs and wait for its end
    pub async fn watch(
        &self,
        app: &AppTarget,
        query: &DeploymentQuery,
        shutdown: &mut ShutdownSignal,
    ) -> Result<Deployment, CliError> {
        println!("Waiting for deployment to start…");
        let deployment = tokio::select! {
            result = wait_for_deployment_start(self.api, app, query, &self.options.poller, &self.sleep_fn) => result?,
            _ = &mut *shutdown => return Err(CliError::Interrupted),
        };
        println!("{}", format!("Deployment started ({})", deployment.id).bold().blue());

        let relay = if self.options.quiet {
            None
        } else {
            Some(self.open_logs(app, &deployment.id))
        };

        println!("Waiting for application logs…");
        let ended = self.await_end(app, &deployment.id, relay, shutdown).await?;
        deployment_result(ended)
    }

    fn open_logs(&self, app: &AppTarget, deployment_id: &str) -> LiveRelay {
        let connector = self.streams.deployment_logs(app, deployment_id);
        let deployment_id = deployment_id.to_string();

        LiveRelay::open(connector, self.options.relay.clone(), move |envelope, _| match envelope {
            StreamEnvelope::Open => debug!("Log stream (open) for deployment {}", deployment_id),
            StreamEnvelope::Log(line) => println!("{}", format_log_line(&line)),
            StreamEnvelope::Close { reason } => debug!("Log stream (close) {}", reason),
            _ => {}
        })
    }

    /// Race the completion watcher against the log relay failing.
    ///
    /// A relay failure ends the wait even if the deployment is still running.
    /// The relay is closed once the deployment has ended, unless following.
    async fn await_end(
        &self,
        app: &AppTarget,
        deployment_id: &str,
        relay: Option<LiveRelay>,
        shutdown: &mut ShutdownSignal,
    ) -> Result<Deployment, CliError> {
        let completion =
            wait_for_deployment_end(self.api, app, deployment_id, &self.options.poller, &self.sleep_fn);
        tokio::pin!(completion);

        let Some(relay) = relay else {
            return tokio::select! {
                result = &mut completion => result,
                _ = &mut *shutdown => Err(CliError::Interrupted),
            };
        };

        let closer = relay.closer();
        let joined = relay.join();
        tokio::pin!(joined);
        let mut relay_stopped = false;

        let result = loop {
            tokio::select! {
                result = &mut completion => break result,
                outcome = &mut joined, if !relay_stopped => match outcome {
                    RelayOutcome::Failed(e) => {
                        warn!("Log relay failed before the deployment ended: {}", e);
                        return Err(CliError::LogStreamError(Box::new(e)));
                    }
                    RelayOutcome::Closed(reason) => {
                        debug!("Log relay closed ({}), still waiting for the deployment", reason);
                        relay_stopped = true;
                    }
                },
                _ = &mut *shutdown => {
                    closer.close("interrupted");
                    if !relay_stopped {
                        let _ = (&mut joined).await;
                    }
                    return Err(CliError::Interrupted);
                }
            }
        };

        if relay_stopped {
            return result;
        }

        if self.options.follow && result.is_ok() {
            if let Ok(deployment) = &result {
                info!("Deployment ended (state:{}), still following logs", deployment.state);
            }
            tokio::select! {
                outcome = &mut joined => {
                    if let RelayOutcome::Failed(e) = outcome {
                        return Err(CliError::LogStreamError(Box::new(e)));
                    }
                }
                _ = &mut *shutdown => {
                    closer.close("interrupted");
                    let _ = (&mut joined).await;
                }
            }
        } else {
            closer.close("deployment ended");
            let _ = (&mut joined).await;
        }

        result
    }
}

/// Translate the terminal state of a deployment into the command result
pub fn deployment_result(deployment: Deployment) -> Result<Deployment, CliError> {
    match deployment.state {
        DeploymentState::Ok => {
            println!("{}", "Deployment successful".bold().green());
            Ok(deployment)
        }
        DeploymentState::Cancelled => Err(CliError::DeploymentCancelled),
        _ => Err(CliError::DeploymentFailed),
    }
}
