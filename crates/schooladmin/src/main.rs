use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use schooladmin::config::DashboardConfig;
use schooladmin::server::create_router;
use schooladmin::types::AppState;

/// Timetable editing service for the school administration dashboard.
#[derive(Debug, Parser)]
#[command(name = "schooladmin", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.bind).
    #[arg(short = 'b', long = "bind")]
    bind: Option<String>,

    /// Base URL of the school REST API (overrides api.base_url).
    #[arg(short = 'a', long = "api-url")]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Level is controlled by RUST_LOG (e.g. RUST_LOG=schooladmin=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            warn!("No configuration file provided, using defaults");
            DashboardConfig::default()
        }
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    config.validate().context("invalid configuration")?;

    info!(
        bind = %config.server.bind,
        api = %config.api.base_url,
        days = config.timetable.days.len(),
        periods = config.timetable.period_count(),
        "Configuration"
    );

    let bind = config.server.bind.clone();
    let state = Arc::new(AppState::new(config).context("building API client")?);
    let sweeper = state.spawn_sweeper();
    let app = create_router(state);

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
