//! Main entry point for the Castlefall server.

use castlefall::{cli, config, server};

use anyhow::Context;
use clap::Parser;
use config::Config;
use server::AppState;
use std::path::PathBuf;

/// Parse CLI args, load config and run the server.
///
/// Usage:
///   castlefall-server [--config PATH] [--bind ADDR] [--grace-secs N]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::ServerCli::parse();

    // If debug is on: show everything at DEBUG level.
    // Otherwise our crates at INFO, everything else at WARN.
    let log_filter = if cli.debug {
        "debug".to_string()
    } else {
        "castlefall=info,castlefall_shared=info,warn".to_string()
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(cli.debug)
        .with_thread_ids(cli.debug)
        .with_file(cli.debug)
        .with_line_number(cli.debug)
        .init();

    let config_path: PathBuf = cli.config.clone();

    // Load or create config file (creates file if missing).
    let mut cfg = Config::load_or_create(&config_path)
        .with_context(|| format!("loading or creating config '{}'", config_path.display()))?;

    // Apply CLI overrides in-memory (non-persistent by default)
    let changed = cli.apply_overrides(&mut cfg);

    if cli.persist && changed {
        cfg.save(&config_path)
            .with_context(|| format!("saving updated config '{}'", config_path.display()))?;
    }

    tracing::info!(
        config = %config_path.display(),
        grace_secs = cfg.reconnect_grace_secs,
        idle_secs = cfg.room_idle_secs,
        assignment = ?cfg.assignment,
        words = cfg.words.len(),
        "configuration loaded"
    );

    let addr = cfg.bind;
    let state = AppState::new(cfg);
    server::run_server(addr, state).await?;
    Ok(())
}
