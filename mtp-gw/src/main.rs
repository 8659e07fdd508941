//! mtp-gw - API gateway for the music translation pipeline
//!
//! Accepts audio + lyrics submissions, enqueues translation jobs on the
//! broker, serves poll results, and manages stored audio artifacts on the
//! shared volume.

use anyhow::Result;
use clap::Parser;
use mtp_common::{Broker, Settings};
use mtp_gw::{build_router, AppState};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mtp-gw", about = "Music translation pipeline API gateway")]
struct Args {
    /// Address to bind the HTTP listener on
    #[arg(long, env = "GATEWAY_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "GATEWAY_PORT", default_value_t = 5730)]
    port: u16,

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

    info!(
        "Starting mtp-gw (API gateway) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut settings = Settings::from_env();
    settings.shared_data_dir = mtp_common::config::override_path(
        &settings.shared_data_dir,
        args.shared_data_dir.as_deref(),
    );

    if settings.access_codes.is_empty() {
        warn!("ACCESS_CODES is empty - every submission will be rejected as unauthorized");
    }

    tokio::fs::create_dir_all(settings.audio_dir()).await?;
    tokio::fs::create_dir_all(settings.lyrics_dir()).await?;
    info!("Shared volume root: {}", settings.shared_data_dir.display());

    let broker = Broker::new(&settings.redis_url(), settings.result_ttl_secs)?;
    info!("Broker: {}", settings.redis_url());

    let state = AppState::new(broker, settings);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((args.bind.as_str(), args.port)).await?;
    info!("Listening on http://{}:{}", args.bind, args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
