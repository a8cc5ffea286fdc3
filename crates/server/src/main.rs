use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use dropshare_server::api::{self, AppState};
use dropshare_server::bootstrap;
use dropshare_server::config::DropshareConfig;
use dropshare_share::ExpirySweeper;

/// DropShare one-time share HTTP server.
#[derive(Parser, Debug)]
#[command(name = "dropshare-server", about = "Standalone HTTP server for DropShare")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "dropshare.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Override the session store connection URL.
    #[arg(long, env = "DROPSHARE_STATE_URL")]
    state_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config_exists = Path::new(&cli.config).exists();
    let mut config: DropshareConfig = if config_exists {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        toml::from_str("")?
    };

    dropshare_server::telemetry::init(&config.logging);

    if !config_exists {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    if let Some(url) = cli.state_url {
        config.state.url = Some(url);
    }

    let service = Arc::new(bootstrap::build_service(&config).await?);

    let (sweeper, sweeper_shutdown) =
        ExpirySweeper::new(Arc::clone(&service), bootstrap::sweeper_config(&config));
    let sweeper_handle = tokio::spawn(sweeper.run());

    let state = AppState::new(Arc::clone(&service), config.blob.max_bytes);
    let app = api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "dropshare-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = sweeper_shutdown.send(()).await;
    if let Err(e) = sweeper_handle.await {
        warn!(error = %e, "expiry sweeper task failed");
    }

    // Wait for pending blob clean-ups (with configurable timeout).
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    info!(
        timeout_secs = config.server.shutdown_timeout_seconds,
        "waiting for pending blob clean-ups..."
    );
    if tokio::time::timeout(shutdown_timeout, service.shutdown())
        .await
        .is_err()
    {
        warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded, some redeemed files are left to the reaper"
        );
    }

    info!("dropshare-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
