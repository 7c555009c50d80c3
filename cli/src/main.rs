//! Clever CLI - Entry Point
//!
//! Deploys applications to Clever Cloud and follows their deployments.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};

use clever_cli::cli::{Cli, Commands};
use clever_cli::commands::{activity, deploy, logs, restart};
use clever_cli::context::{config_layout, load_settings, Context};
use clever_cli::errors::CliError;
use clever_cli::logs::{init_logging, LogOptions};
use clever_cli::utils::version_info;
use clever_cli::watch::orchestrator::ShutdownSignal;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Version = cli.command {
        println!("{}", serde_json::to_string_pretty(&version_info())?);
        return Ok(());
    }

    let layout = config_layout(&cli);
    let settings = load_settings(&layout).await?;

    let log_options = LogOptions {
        log_level: cli.requested_log_level().unwrap_or(settings.log_level),
        json_format: cli.log_json,
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    debug!("Using configuration directory {}", layout.base_dir.display());
    let ctx = Context::new(&cli, settings)?;
    let shutdown: ShutdownSignal = Box::pin(await_shutdown_signal());

    match &cli.command {
        Commands::Deploy(args) => deploy::execute(&ctx, args, shutdown).await,
        Commands::Restart(args) => restart::execute(&ctx, args, shutdown).await,
        Commands::Logs(args) => logs::execute(&ctx, args, shutdown).await,
        Commands::Activity(args) => activity::execute(&ctx, args, shutdown).await,
        Commands::Version => Ok(()),
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, shutting down...");
                    }
                    _ = sigint.recv() => {
                        info!("SIGINT received, shutting down...");
                    }
                }
            }
            _ => {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl+C received, shutting down...");
                } else {
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        } else {
            std::future::pending::<()>().await;
        }
    }
}
