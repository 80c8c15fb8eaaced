//! # System Lifecycle
//!
//! [`BotSystem`] is the conductor of the sample application. It owns the [`BotManager`], seeds
//! it with the configured bots, and coordinates a bounded shutdown.
//!
//! ## Startup
//!
//! ```rust,ignore
//! let system = BotSystem::from_config(&config)?;   // registers every configured bot
//! ```
//!
//! Registration only spawns the bot tasks. A bot whose token is rejected by its runner shows up
//! as `Failed` in [`BotManager::list`], it does not fail startup.
//!
//! ## Graceful Shutdown
//!
//! 1. **Drain the registry** - `stop_all` cancels every bot at once
//! 2. **Await completion** - wait for each task to return from its runner
//! 3. **Bound the wait** - give up after the configured timeout
//!
//! Cancellation is cooperative, so a runner that ignores it would keep `stop_all` pending
//! forever. The drain runs on its own task; on timeout the system logs which bots were still
//! registered when shutdown began and returns [`ShutdownError::TimedOut`] instead of hanging
//! the caller.

use crate::config::AppConfig;
use crate::runners::default_runner;
use bot_manager::{Bot, BotManager, ManagerError, Runner};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub type SharedManager = Arc<BotManager<Arc<dyn Runner>>>;

#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("Bots did not stop within {0:?}")]
    TimedOut(Duration),
    #[error("Shutdown task failed: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

pub struct BotSystem {
    manager: SharedManager,
}

impl BotSystem {
    /// Creates a system with no bots, running every bot with `runner`.
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self {
            manager: Arc::new(BotManager::new(runner)),
        }
    }

    /// Creates the system the binary runs and registers every configured bot.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn from_config(config: &AppConfig) -> Result<Self, ManagerError> {
        let system = Self::new(default_runner(config.heartbeat));
        system.seed(&config.bots)?;
        Ok(system)
    }

    /// Registers `bots`, stopping at the first one that cannot be registered.
    pub fn seed(&self, bots: &[Bot]) -> Result<(), ManagerError> {
        for bot in bots {
            self.manager.register(bot.name.clone(), bot.token.clone())?;
        }
        info!(count = bots.len(), "Bots seeded");
        Ok(())
    }

    pub fn manager(&self) -> &SharedManager {
        &self.manager
    }

    /// Stops every bot, waiting at most `timeout` for them to exit.
    pub async fn shutdown(self, timeout: Duration) -> Result<(), ShutdownError> {
        let pending: Vec<String> = self
            .manager
            .list()
            .into_iter()
            .map(|snapshot| snapshot.bot.token)
            .collect();
        info!(count = pending.len(), ?timeout, "Shutting down");

        let manager = self.manager.clone();
        let drain = tokio::spawn(async move { manager.stop_all().await });

        match tokio::time::timeout(timeout, drain).await {
            Ok(Ok(())) => {
                info!("All bots stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "Shutdown task failed");
                Err(ShutdownError::Aborted(e))
            }
            Err(_) => {
                warn!(?timeout, ?pending, "Bots ignored cancellation, giving up on them");
                Err(ShutdownError::TimedOut(timeout))
            }
        }
    }
}
