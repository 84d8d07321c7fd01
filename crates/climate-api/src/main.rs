//! Climate API server
//!
//! Serves four query shapes over a pre-populated SQLite climate dataset:
//! precipitation history, the station list, the trailing year of
//! temperature observations, and min/avg/max aggregates over a
//! caller-specified date range.

use argh::FromArgs;
use climate_api::{run_http_server, ClimateStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(FromArgs)]
/// Read-only HTTP API over a SQLite climate observation dataset
struct Args {
    /// path to the SQLite dataset file
    #[argh(option, short = 'd')]
    database: PathBuf,

    /// port to listen on
    #[argh(option, short = 'p', default = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();

    log::info!("Opening dataset at {}", args.database.display());
    let store = ClimateStore::open(&args.database)?;

    let (station_count, observation_count) = store.counts()?;
    log::info!(
        "Dataset ready: {} stations, {} observations",
        station_count,
        observation_count
    );

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // Set up Ctrl+C handler
    ctrlc::set_handler({
        let shutdown_tx = shutdown_tx.clone();
        move || {
            log::info!("Received Ctrl+C, shutting down gracefully...");
            shutdown_tx.send(()).ok();
        }
    })?;

    run_http_server(Arc::new(store), args.port, shutdown_rx).await?;

    log::info!("Climate API stopped.");

    Ok(())
}
