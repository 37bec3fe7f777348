//! LiveStage - synchronized audio-reactive virtual concert
//!
//! `serve` runs the session server; `simulate` plays a show in-process with
//! two viewers and prints what they saw.

#![warn(missing_docs)]

mod cli;
mod config;
mod logging_setup;
mod simulate;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use livestage_control::{InMemoryTicketRegistry, SessionCoordinator, WebServer};
use tracing::info;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    let _log_guard = logging_setup::init(&config.logging)?;

    info!("==========================================");
    info!("===     LiveStage {:<8} starting     ===", env!("CARGO_PKG_VERSION"));
    info!("==========================================");

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Command::Simulate(args) => {
            let summary = simulate::run(&config, &args)?;
            println!("{:#?}", summary);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let coordinator = SessionCoordinator::with_system_clock(config.session).into_shared();
    let tickets = Arc::new(InMemoryTicketRegistry::new());
    let server = WebServer::new(config.server, coordinator, tickets);

    tokio::select! {
        result = server.run() => result.context("Web server stopped"),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutting down");
            Ok(())
        }
    }
}
