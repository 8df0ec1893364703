// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow Orchestrator Daemon (panicforged)
//!
//! Background process that reproduces and repairs panics found by a
//! randomized database simulator. Reads configuration, starts the IPC
//! timer server and the orchestrator's poll/admit loop, and traps
//! SIGTERM/SIGINT for a cooperative shutdown.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::sync::Arc;

use panicforge_core::Config;
use panicforge_daemon::Orchestrator;
use panicforge_sandbox::OsSandboxExecutor;
use panicforge_storage::Store;
use panicforge_timer::TimerRegistry;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Handle info flags before any config load.
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("panicforged {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            path => {
                if let Err(e) = run(PathBuf::from(path)).await {
                    eprintln!("panicforged: fatal: {e}");
                    std::process::exit(1);
                }
                return;
            }
        }
    }

    eprintln!("panicforged: missing required argument <config-path>");
    print_help();
    std::process::exit(1);
}

fn print_help() {
    println!("panicforged {}", env!("CARGO_PKG_VERSION"));
    println!("Reproduces and repairs panics found by the randomized database simulator.");
    println!();
    println!("USAGE:");
    println!("    panicforged <config-path>");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}

async fn run(config_path: PathBuf) -> anyhow::Result<()> {
    let config = Config::load(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to load config at {}: {e}", config_path.display()))?;
    let config = Arc::new(config);

    let _log_guard = setup_logging(&config);

    info!(config_path = %config_path.display(), "starting panicforged");

    let store = Arc::new(
        Store::open(&config.store_path)
            .map_err(|e| anyhow::anyhow!("failed to open store at {}: {e}", config.store_path.display()))?,
    );
    let sandbox = Arc::new(OsSandboxExecutor::new(config.base_repo_path.clone()));
    let timer = Arc::new(TimerRegistry::new());

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        Arc::clone(&sandbox),
        Arc::clone(&timer),
        Arc::clone(&config),
    ));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let server_timer = Arc::clone(&timer);
    let ipc_port = config.ipc_port;
    let server_task = tokio::spawn(async move { panicforge_timer::serve(ipc_port, server_timer).await });

    let loop_orchestrator = Arc::clone(&orchestrator);
    let loop_task = tokio::spawn(async move { loop_orchestrator.run().await });

    info!("panicforged ready");

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!(error = %e, "ipc timer server exited unexpectedly"),
                Err(e) => error!(error = %e, "ipc timer server task panicked"),
                Ok(Ok(())) => {}
            }
        }
        result = loop_task => {
            if let Err(e) = result {
                error!(error = %e, "orchestrator loop task panicked");
            }
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down");
        }
    }

    orchestrator.request_shutdown();
    orchestrator.wait_for_in_flight().await;
    info!("panicforged stopped");

    Ok(())
}

fn setup_logging(config: &Config) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = config.min_log_level.clone().unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    guard
}
