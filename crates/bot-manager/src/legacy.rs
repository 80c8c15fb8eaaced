//! # Start/Stop Adapter
//!
//! Older bot implementations expose a `start(token)` / `stop(token)` pair instead of a single
//! run-until-cancelled future. [`StartStopAdapter`] folds such an implementation into a
//! [`Runner`], so the manager only ever deals with one capability.

use crate::error::RunError;
use crate::runner::Runner;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A bot that is started and stopped by two separate calls.
#[async_trait]
pub trait LifecycleRunner: Send + Sync + 'static {
    /// Starts the bot. Should return once the bot is up, not when it finishes.
    async fn start(&self, token: &str) -> Result<(), RunError>;

    /// Stops a bot previously started with [`LifecycleRunner::start`].
    async fn stop(&self, token: &str) -> Result<(), RunError>;
}

/// Adapts a [`LifecycleRunner`] to the [`Runner`] contract.
///
/// The resulting run calls `start`, waits for cancellation, then calls `stop`.
/// A failing `start` fails the run right away and `stop` is never called.
pub struct StartStopAdapter<L> {
    inner: L,
}

impl<L: LifecycleRunner> StartStopAdapter<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LifecycleRunner> Runner for StartStopAdapter<L> {
    async fn run(&self, cancel: CancellationToken, token: &str) -> Result<(), RunError> {
        if let Err(e) = self.inner.start(token).await {
            warn!(token, error = %e, "start failed");
            return Err(e);
        }
        debug!(token, "started");

        cancel.cancelled().await;

        self.inner.stop(token).await?;
        debug!(token, "stopped");
        Ok(())
    }
}
