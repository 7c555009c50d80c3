//! `clever restart`: redeploy a commit and watch the deployment

use colored::Colorize;

use crate::cli::RestartArgs;
use crate::context::{self, Context};
use crate::errors::CliError;
use crate::watch::orchestrator::{DeploymentOrchestrator, RedeployRequest, ShutdownSignal};
use crate::watch::AppTarget;

pub async fn execute(ctx: &Context, args: &RestartArgs, mut shutdown: ShutdownSignal) -> Result<(), CliError> {
    let cwd = std::env::current_dir()?;
    let (repo, linked) = context::linked_app(&cwd, args.alias.as_deref()).await?;
    let app = AppTarget::new(&linked.org_id, &linked.app_id);

    let full_commit_id = match &args.commit {
        Some(commit) => Some(repo.resolve_full_commit(commit).await?),
        None => None,
    };
    let application = ctx.api.get_application(&app).await?;

    if let Some(commit_id) = full_commit_id.as_ref().or(application.commit_id.as_ref()) {
        let cache_suffix = if args.without_cache { " without using cache" } else { "" };
        println!(
            "Restarting {} on commit {}{}",
            linked.name,
            commit_id.green(),
            cache_suffix
        );
    }

    let request = RedeployRequest {
        commit_id: full_commit_id,
        use_cache: !args.without_cache,
    };
    let orchestrator = DeploymentOrchestrator::new(
        &ctx.api,
        &ctx.streams,
        ctx.watch_options(args.quiet, args.follow),
        tokio::time::sleep,
    );
    orchestrator
        .redeploy_and_watch(&app, &request, &mut shutdown)
        .await?;

    Ok(())
}
