//! Writes a fresh batch of simulated stock observations to the batch file on
//! a fixed interval.
//!
//! Run with: cargo run --bin stock-simulator -- [--once] [--output PATH] [--interval-secs N]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use stockwatch_api as api;
use api::services::simulator::{RandomStockSource, Simulator};

#[derive(Debug, Parser)]
#[command(name = "stock-simulator", about = "Simulated retail stock feed")]
struct Cli {
    /// Write a single batch and exit
    #[arg(long)]
    once: bool,

    /// Batch file to overwrite (defaults to the configured batch_file)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Seconds between batches (defaults to simulator.interval_secs)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let mut sim_cfg = cfg.simulator.clone();
    if let Some(secs) = cli.interval_secs {
        sim_cfg.interval_secs = secs;
    }
    let output = cli.output.unwrap_or_else(|| cfg.batch_file.clone());

    info!(
        areas = sim_cfg.areas.len(),
        products = sim_cfg.products.len(),
        output = %output.display(),
        "starting stock simulator"
    );

    let simulator = Simulator::new(RandomStockSource, sim_cfg, output);

    if cli.once {
        let batch = simulator.run_once().await?;
        info!(records = batch.len(), "single batch written");
        return Ok(());
    }

    simulator.run_until(shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
