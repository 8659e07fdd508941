//! mtp-wk - Translation pipeline worker
//!
//! Dequeues translation jobs from the broker, drives the analyzer DAG for
//! each, stores results, and executes cleanup jobs.

use anyhow::Result;
use clap::Parser;
use mtp_common::{Broker, Settings};
use mtp_wk::Worker;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "mtp-wk", about = "Music translation pipeline worker")]
struct Args {
    /// Override the shared volume root
    #[arg(long, env = "SHARED_DATA_DIR")]
    shared_data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting mtp-wk (worker) v{}", env!("CARGO_PKG_VERSION"));

    let mut settings = Settings::from_env();
    settings.shared_data_dir = mtp_common::config::override_path(
        &settings.shared_data_dir,
        args.shared_data_dir.as_deref(),
    );
    info!("Broker: {}", settings.redis_url());
    info!("Shared volume root: {}", settings.shared_data_dir.display());

    let broker = Arc::new(Broker::new(&settings.redis_url(), settings.result_ttl_secs)?);
    let worker = Worker::new(&settings, broker)?;

    worker.connect_with_retries().await?;
    worker.run().await
}
