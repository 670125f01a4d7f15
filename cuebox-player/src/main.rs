//! Cuebox Player (cuebox-player) - Main entry point
//!
//! Loads the playback configuration, brings up the rodio engine and the
//! playback manager, optionally starts a track list from the command
//! line, and runs until interrupted.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cuebox_player::config::Config;
use cuebox_player::engine::RodioEngine;
use cuebox_player::Manager;

/// Command-line arguments for cuebox-player
#[derive(Parser, Debug)]
#[command(name = "cuebox-player")]
#[command(about = "Configuration-driven playback controller")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "cuebox.toml", env = "CUEBOX_CONFIG")]
    config: PathBuf,

    /// Track list to start immediately, as "GROUP:TRACK_LIST" indices
    #[arg(short, long)]
    play: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cuebox_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Loading configuration from {}", args.config.display());
    let config = Config::load(&args.config)
        .await
        .context("Failed to load configuration")?;

    let engine = RodioEngine::new().context("Failed to start audio engine")?;
    let manager = Manager::new(config, Box::new(engine))
        .context("Failed to initialize playback manager")?;
    info!(
        "Playback manager initialized with {} group(s)",
        manager.groups().len()
    );

    if let Some(play) = &args.play {
        let (group_index, track_list_index) = parse_play_target(play)?;
        manager
            .request_play(group_index, track_list_index)
            .await
            .context("Failed to start playback")?;
    }

    shutdown_signal().await;

    // Stop any running session before exiting
    manager.cancel().await;
    info!("Shutdown complete");
    Ok(())
}

/// Parse a "GROUP:TRACK_LIST" index pair from the command line
fn parse_play_target(value: &str) -> Result<(usize, usize)> {
    let Some((group, track_list)) = value.split_once(':') else {
        bail!("expected GROUP:TRACK_LIST indices, got '{}'", value);
    };
    let group = group
        .trim()
        .parse()
        .with_context(|| format!("invalid group index '{}'", group))?;
    let track_list = track_list
        .trim()
        .parse()
        .with_context(|| format!("invalid track list index '{}'", track_list))?;
    Ok((group, track_list))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
