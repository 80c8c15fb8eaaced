//! # Runner Trait
//!
//! The `Runner` trait is the unit of work the [`BotManager`](crate::BotManager) executes once per
//! registered bot. The manager hands it a [`CancellationToken`] and the bot's token, and expects
//! `run` to keep going until cancellation is requested.
//!
//! # Cooperative Cancellation
//! The manager never kills a task. It cancels the token and then waits for `run` to return.
//! A runner that ignores the token makes [`BotManager::remove`](crate::BotManager::remove) and
//! [`BotManager::stop_all`](crate::BotManager::stop_all) wait forever.
//!
//! # Outcomes
//! - `Ok(())`, or `Err(RunError::Cancelled)` after cancellation was requested → the bot ends up
//!   [`Stopped`](crate::BotStatus::Stopped).
//! - `Err(RunError::Failed(_))` → the bot ends up [`Failed`](crate::BotStatus::Failed).

use crate::error::RunError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A long-running unit of work bound to one bot token.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use bot_manager::{RunError, Runner};
/// use tokio_util::sync::CancellationToken;
///
/// struct Idle;
///
/// #[async_trait]
/// impl Runner for Idle {
///     async fn run(&self, cancel: CancellationToken, _token: &str) -> Result<(), RunError> {
///         cancel.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Runner: Send + Sync + 'static {
    /// Runs the bot identified by `token` until `cancel` fires.
    ///
    /// Must return promptly once cancellation is observed.
    async fn run(&self, cancel: CancellationToken, token: &str) -> Result<(), RunError>;
}

#[async_trait]
impl<R: Runner + ?Sized> Runner for Arc<R> {
    async fn run(&self, cancel: CancellationToken, token: &str) -> Result<(), RunError> {
        (**self).run(cancel, token).await
    }
}

/// Closure-backed runner.
///
/// The closure is called once per registered bot and produces a fresh future that owns
/// its own state. Share state across bots explicitly through an `Arc` captured by the closure.
///
/// ```rust
/// use bot_manager::{RunError, RunnerFn};
/// use tokio_util::sync::CancellationToken;
///
/// let runner = RunnerFn::new(|cancel: CancellationToken, _token: String| async move {
///     cancel.cancelled().await;
///     Ok::<_, RunError>(())
/// });
/// # let _ = runner;
/// ```
pub struct RunnerFn<F> {
    f: F,
}

impl<F> RunnerFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Runner for RunnerFn<F>
where
    F: Fn(CancellationToken, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RunError>> + Send + 'static,
{
    async fn run(&self, cancel: CancellationToken, token: &str) -> Result<(), RunError> {
        (self.f)(cancel, token.to_string()).await
    }
}
