//! `clever deploy`: push the source code and watch the deployment

use colored::Colorize;

use crate::cli::DeployArgs;
use crate::context::{self, Context};
use crate::errors::CliError;
use crate::watch::orchestrator::{DeploymentOrchestrator, PushRequest, ShutdownSignal};
use crate::watch::AppTarget;

pub async fn execute(ctx: &Context, args: &DeployArgs, mut shutdown: ShutdownSignal) -> Result<(), CliError> {
    let cwd = std::env::current_dir()?;
    let (repo, linked) = context::linked_app(&cwd, args.alias.as_deref()).await?;
    let app = AppTarget::new(&linked.org_id, &linked.app_id);

    let refspec = repo.full_branch(args.branch.as_deref()).await?;
    let commit_id = repo.branch_commit(&refspec).await?;
    let remote_head = repo.remote_head_commit(&linked.deploy_url).await?;
    let deployed = ctx.api.get_application(&app).await?.commit_id;

    repo.add_remote(&linked.alias, &linked.deploy_url).await?;

    check_not_up_to_date(&commit_id, remote_head.as_deref(), deployed.as_deref())?;

    match (&remote_head, &deployed) {
        (Some(remote_head), Some(deployed)) => {
            println!("Remote git head commit   is {}", remote_head.green());
            println!("Current deployed commit  is {}", deployed.green());
        }
        _ => println!("App is brand new, no commits on remote yet"),
    }
    println!(
        "New local commit to push is {} (from {})",
        commit_id.green(),
        refspec.green()
    );

    let push = PushRequest {
        remote_url: linked.deploy_url.clone(),
        refspec,
        commit_id,
        force: args.force,
    };
    let orchestrator = DeploymentOrchestrator::new(
        &ctx.api,
        &ctx.streams,
        ctx.watch_options(args.quiet, args.follow),
        tokio::time::sleep,
    );
    orchestrator
        .push_and_watch(&repo, &app, &push, &mut shutdown)
        .await?;

    Ok(())
}

/// Pushing the commit the remote already has would not trigger a deployment
fn check_not_up_to_date(
    commit_id: &str,
    remote_head: Option<&str>,
    deployed: Option<&str>,
) -> Result<(), CliError> {
    let Some(remote_head) = remote_head.filter(|head| *head == commit_id) else {
        return Ok(());
    };

    let message = format!(
        "The clever-cloud application is up-to-date ({}). Try this command to restart the application:",
        remote_head
    );
    if deployed != Some(commit_id) {
        return Err(CliError::UpToDate(format!(
            "{}\nclever restart --commit {}",
            message, commit_id
        )));
    }
    Err(CliError::UpToDate(format!("{}\nclever restart", message)))
}
