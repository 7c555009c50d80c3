//! `clever logs`: past logs, then live logs

use chrono::Utc;
use tracing::debug;

use crate::cli::LogsArgs;
use crate::context::{self, Context};
use crate::errors::CliError;
use crate::http::logs::LogQuery;
use crate::output::format_log_line;
use crate::watch::orchestrator::ShutdownSignal;
use crate::watch::relay::{LiveRelay, RelayOutcome, StreamEnvelope};

/// Query matching the command line filters, blank values meaning no filter
fn log_query(args: &LogsArgs) -> LogQuery {
    let non_blank = |value: &Option<String>| value.clone().filter(|value| !value.trim().is_empty());
    LogQuery {
        since: args.since,
        until: args.before,
        filter: non_blank(&args.search),
        deployment_id: non_blank(&args.deployment_id),
    }
}

pub async fn execute(ctx: &Context, args: &LogsArgs, mut shutdown: ShutdownSignal) -> Result<(), CliError> {
    let target_id = match &args.addon {
        Some(addon_id) => addon_id.clone(),
        None => {
            let cwd = std::env::current_dir()?;
            context::linked_app(&cwd, args.alias.as_deref()).await?.1.app_id
        }
    };

    let query = log_query(args);
    let now = Utc::now();

    if query.since.is_none_or(|since| since < now) {
        let mut old_logs = ctx.api.get_old_logs(&target_id, &query).await?;
        old_logs.reverse();
        for line in &old_logs {
            println!("{}", format_log_line(line));
        }
    }

    if query.until.is_some_and(|until| until < now) {
        return Ok(());
    }

    let live_query = LogQuery {
        since: None,
        ..query.clone()
    };
    let until = query.until;
    let connector = ctx.streams.app_logs(&target_id, &live_query);
    let relay = LiveRelay::open(connector, ctx.settings.watch.relay_options(), move |envelope, closer| {
        match envelope {
            StreamEnvelope::Open => debug!("Log stream (open)"),
            StreamEnvelope::Log(line) => {
                if until.is_some_and(|until| line.timestamp() > until) {
                    closer.close("end date reached");
                } else {
                    println!("{}", format_log_line(&line));
                }
            }
            StreamEnvelope::Ping => debug!("Log stream (ping)"),
            StreamEnvelope::Close { reason } => debug!("Log stream (close) {}", reason),
            StreamEnvelope::Event(_) => {}
        }
    });

    let closer = relay.closer();
    let joined = relay.join();
    tokio::pin!(joined);

    tokio::select! {
        outcome = &mut joined => match outcome {
            RelayOutcome::Closed(_) => Ok(()),
            RelayOutcome::Failed(e) => Err(e),
        },
        _ = &mut shutdown => {
            closer.close("interrupted");
            let _ = joined.await;
            Ok(())
        }
    }
}
