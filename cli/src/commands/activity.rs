//! `clever activity`: deployment history, optionally followed live

use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::ActivityArgs;
use crate::context::{self, Context};
use crate::errors::CliError;
use crate::output::activity::{apply_event, print_rendering, render_history};
use crate::watch::orchestrator::ShutdownSignal;
use crate::watch::relay::{LiveRelay, RelayOutcome, StreamEnvelope};
use crate::watch::{AppTarget, DeploymentApi};

/// Deployments shown unless the whole history is requested
const ACTIVITY_LIMIT: u32 = 10;

pub async fn execute(ctx: &Context, args: &ActivityArgs, mut shutdown: ShutdownSignal) -> Result<(), CliError> {
    let cwd = std::env::current_dir()?;
    let (_, linked) = context::linked_app(&cwd, args.alias.as_deref()).await?;
    let app = AppTarget::new(&linked.org_id, &linked.app_id);

    let limit = if args.show_all { None } else { Some(ACTIVITY_LIMIT) };
    let deployments = ctx.api.list_deployments(&app, limit).await?;

    let (mut previous, renderings) = render_history(&deployments);
    for rendering in &renderings {
        print_rendering(rendering);
    }

    if !args.follow {
        return Ok(());
    }

    // Events are rendered here, the relay handler only forwards them
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let connector = ctx.streams.app_events(&app.app_id)?;
    let relay = LiveRelay::open(connector, ctx.settings.watch.relay_options(), move |envelope, _| {
        match envelope {
            StreamEnvelope::Open => debug!("Event stream (open) for {}", linked.app_id),
            StreamEnvelope::Event(event) => {
                let _ = events_tx.send(event);
            }
            StreamEnvelope::Ping => debug!("Event stream (ping)"),
            StreamEnvelope::Close { reason } => debug!("Event stream (close) {}", reason),
            StreamEnvelope::Log(_) => {}
        }
    });

    let closer = relay.closer();
    let joined = relay.join();
    tokio::pin!(joined);

    loop {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                let (next, rendering) = apply_event(previous, &event);
                if let Some(rendering) = rendering {
                    print_rendering(&rendering);
                }
                previous = next;
            }
            outcome = &mut joined => {
                return match outcome {
                    RelayOutcome::Closed(_) => Ok(()),
                    RelayOutcome::Failed(e) => Err(e),
                };
            }
            _ = &mut shutdown => {
                closer.close("interrupted");
                let _ = joined.await;
                return Ok(());
            }
        }
    }
}
