//! Tilewar - Unified CLI
//!
//! Serves rounds over HTTP or plays them at the terminal.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tilewar::console::{self, ConsoleOptions};
use tilewar::{ArenaConfig, RoundRegistry, Seating};
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port, config } => run_server(host, port, config).await,
        Command::Local {
            board_shape,
            board_tiles,
            attacker_type,
            defender_type,
            auto,
            rounds,
            seed,
        } => {
            let default_filter = if auto { "warn" } else { "info" };
            init_tracing(default_filter);

            let mut options =
                ConsoleOptions::parse(&board_shape, &board_tiles, &attacker_type, &defender_type)?;
            options.auto = auto;
            options.rounds = rounds;
            let seating = match seed {
                Some(seed) => Seating::default().with_seed(seed),
                None => Seating::default(),
            };

            // Manual players block on stdin.
            let scores =
                tokio::task::spawn_blocking(move || console::run(&options, &seating)).await??;
            info!(rounds = scores.len(), "Console session finished");
            Ok(())
        }
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

/// Run the HTTP round server
#[instrument(skip_all, fields(host = %host, port = port))]
async fn run_server(host: String, port: u16, config: PathBuf) -> Result<()> {
    init_tracing("info,tilewar=debug");

    let config = ArenaConfig::load_or_default(&config)?;
    let registry = Arc::new(RoundRegistry::new(config.clone()));

    let sweeper = {
        let registry = registry.clone();
        let mut interval = tokio::time::interval(config.sweep_interval());
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                let registry = registry.clone();
                match tokio::task::spawn_blocking(move || registry.sweep()).await {
                    Ok(report) => debug!(
                        ended = report.ended.len(),
                        reclaimed = report.reclaimed.len(),
                        "Sweep finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "Sweep task failed"),
                }
            }
        })
    };

    let app = tilewar::server::router(registry.clone());
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("Server ready at http://{}:{}/", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown requested");
        })
        .await?;

    sweeper.abort();
    tokio::task::spawn_blocking(move || registry.shutdown()).await?;
    info!("Server stopped");
    Ok(())
}
