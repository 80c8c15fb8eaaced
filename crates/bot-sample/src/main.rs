//! # Bot Sample
//!
//! Runs the bots listed in `BOTS` until Ctrl+C or SIGTERM, then drains them.
//!
//! ## Core Components
//!
//! - **[config]**: [`CliArgs`] parsed from flags and environment, validated into [`AppConfig`].
//! - **[runners]**: the heartbeat bot, the legacy poller, and the prefix router between them.
//! - **[lifecycle]**: [`BotSystem`], which seeds the manager and bounds shutdown.
//!
//! ## Quick Start
//!
//! ```bash
//! BOTS=alpha:tok-1,beta:legacy-tok-2,gamma:fail-tok-3 cargo run -p bot-sample
//! APP_ENV=prod RUST_LOG=warn cargo run -p bot-sample -- --bots alpha:tok-1
//! ```
//!
//! [config]: bot_sample::config
//! [runners]: bot_sample::runners
//! [lifecycle]: bot_sample::lifecycle

use bot_manager::tracing::setup_tracing;
use bot_sample::config::{AppConfig, CliArgs};
use bot_sample::lifecycle::BotSystem;
use clap::Parser;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = AppConfig::try_from(args)?;

    setup_tracing(config.env.log_format(), config.env.default_directive());
    info!(env = ?config.env, bots = config.bots.len(), "Starting bot system");

    let system = BotSystem::from_config(&config)?;
    for snapshot in system.manager().list() {
        info!(name = snapshot.name(), token = snapshot.token(), status = %snapshot.status, "Bot");
    }

    shutdown_signal().await?;

    system.shutdown(config.shutdown_timeout).await?;
    info!("Application completed successfully");
    Ok(())
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    let terminate = terminate.recv();

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Option<()>>();

    tokio::select! {
        res = signal::ctrl_c() => {
            res?;
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
    Ok(())
}
