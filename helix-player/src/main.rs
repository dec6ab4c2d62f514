//! Helix Player (helix-player) - Main entry point
//!
//! Serves the playback queue engine to the browser front end: JSON control
//! endpoints, the player event stream and the sink command stream.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use helix_common::{EventBus, SinkKind};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use helix_player::api::{self, AppContext};
use helix_player::config::TomlConfig;
use helix_player::playback::{EngineHandle, PlayerEngine, RemoteSink};

/// Filter used when neither RUST_LOG nor the config file sets one
const DEFAULT_LOG_FILTER: &str = "helix_player=debug,tower_http=debug";

/// Command-line arguments for helix-player
#[derive(Parser, Debug)]
#[command(name = "helix-player")]
#[command(about = "Playback queue engine for the helix media front end")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "HELIX_PLAYER_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let mut config =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    init_tracing(&config)?;

    info!("Starting helix-player on port {}", config.port);

    let events = EventBus::new(config.event_bus_capacity);
    let (sink_commands, _) = broadcast::channel(config.event_bus_capacity);

    // Browser-hosted sinks
    let audio = RemoteSink::new(SinkKind::Audio, &config.sinks.audio, sink_commands.clone());
    let video = RemoteSink::new(SinkKind::Video, &config.sinks.video, sink_commands.clone());

    // Initialize playback engine
    let engine = PlayerEngine::new(Box::new(audio), Box::new(video), events.clone());
    let (engine, engine_task) = EngineHandle::spawn(engine);
    info!("Playback engine initialized");

    // Build the application router
    let app = api::create_router(AppContext {
        engine,
        events,
        sink_commands,
    });

    let addr = config.socket_addr().context("Invalid listen address")?;
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The router (and every engine handle) is gone; the engine task drains and exits
    if let Err(e) = engine_task.await {
        error!("Playback engine task failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing from RUST_LOG, else the configured level, else the default
fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            config
                .logging
                .level
                .as_deref()
                .and_then(|level| EnvFilter::try_new(level).ok())
        })
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
