//! # Bot Manager
//!
//! This module defines [`BotManager`], the exclusive owner of the token-keyed registry of running
//! bots. It spawns one Tokio task per registered bot, guarantees that a token is never bound to
//! two live tasks, and guarantees that a bot's task has fully exited (not just been signalled)
//! before `remove` or `stop_all` return.

use crate::entry::{Bot, BotEntry, BotSnapshot};
use crate::error::{ManagerError, RunError};
use crate::runner::Runner;
use crate::status::BotStatus;
use futures::future::join_all;
use futures::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Registry and supervisor of a dynamic set of long-running bots.
///
/// # Concurrency Model
/// All public operations run synchronously on the caller's task. The registry sits behind a
/// single `RwLock` that is only ever held for map operations, never across an `.await`:
///
/// * **register** - duplicate check, spawn, and insert happen in one critical section, so a
///   token can never end up with two tasks.
/// * **remove** - the entry leaves the map under the lock, so a concurrent `list`/`bot` no
///   longer sees it and a second `remove` gets `NotFound`. The caller then waits for the task
///   outside the lock.
/// * **stop_all** - swaps the whole map for an empty one, cancels every detached entry, and
///   only then starts waiting. No bot's shutdown is serialized behind another's.
///
/// A `remove` racing `stop_all` on the same token is decided by whoever takes the entry out of
/// the map first; the loser gets [`ManagerError::NotFound`].
///
/// # Blocking Risk
/// Cancellation is cooperative. If a [`Runner`] never observes its token, `remove` and
/// `stop_all` wait forever. Bound them with `tokio::time::timeout` if that matters to you.
///
/// # Example
/// ```rust
/// use bot_manager::{BotManager, BotStatus, RunError, RunnerFn};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let manager = BotManager::new(RunnerFn::new(|cancel: CancellationToken, _token: String| async move {
///         cancel.cancelled().await;
///         Ok::<_, RunError>(())
///     }));
///
///     manager.register("bot1", "tok-A").unwrap();
///     assert!(manager.register("bot2", "tok-A").is_err());
///     assert_eq!(manager.bot("tok-A").unwrap().name(), "bot1");
///
///     let last = manager.remove("tok-A").await.unwrap();
///     assert_eq!(last.status, BotStatus::Stopped);
///     assert!(manager.bot("tok-A").is_none());
/// }
/// ```
pub struct BotManager<R: Runner> {
    runner: Arc<R>,
    bots: RwLock<HashMap<String, BotEntry>>,
}

impl<R: Runner> BotManager<R> {
    /// Creates an empty manager that runs every bot with `runner`.
    pub fn new(runner: R) -> Self {
        Self::with_shared(Arc::new(runner))
    }

    /// Creates an empty manager around a runner that is shared with other owners.
    pub fn with_shared(runner: Arc<R>) -> Self {
        Self {
            runner,
            bots: RwLock::new(HashMap::new()),
        }
    }

    /// The runner every bot of this manager is run with.
    pub fn runner(&self) -> &Arc<R> {
        &self.runner
    }

    /// Registers a bot and spawns its task.
    ///
    /// Returns as soon as the task is spawned; it does not wait for the bot to reach
    /// `Running`. Use [`BotManager::watch_status`] for that.
    ///
    /// # Errors
    /// [`ManagerError::DuplicateToken`] if `token` is already registered. Nothing is spawned
    /// and the registry is left untouched.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn register(
        &self,
        name: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<(), ManagerError> {
        let bot = Bot::new(name, token);
        let mut bots = self.bots.write();

        if bots.contains_key(&bot.token) {
            warn!(token = %bot.token, name = %bot.name, "Duplicate token");
            return Err(ManagerError::DuplicateToken(bot.token));
        }

        let cancel = CancellationToken::new();
        let (status, _) = watch::channel(BotStatus::Starting);
        let status = Arc::new(status);
        let done = tokio::spawn(supervise(
            self.runner.clone(),
            bot.token.clone(),
            cancel.clone(),
            status.clone(),
        ));

        info!(token = %bot.token, name = %bot.name, size = bots.len() + 1, "Registered");
        bots.insert(
            bot.token.clone(),
            BotEntry {
                bot,
                cancel,
                done,
                status,
            },
        );
        Ok(())
    }

    /// Removes a bot, cancels it, and waits until its task has exited.
    ///
    /// The entry disappears from the registry before cancellation is issued. On success the
    /// returned snapshot carries the bot's terminal status, which is how a failing run is
    /// reported to the caller.
    ///
    /// # Errors
    /// [`ManagerError::NotFound`] if `token` is not registered (including when a concurrent
    /// `remove` or `stop_all` got to it first).
    pub async fn remove(&self, token: &str) -> Result<BotSnapshot, ManagerError> {
        let entry = {
            let mut bots = self.bots.write();
            bots.remove(token)
        };
        let Some(entry) = entry else {
            warn!(token, "Not found");
            return Err(ManagerError::NotFound(token.to_string()));
        };

        debug!(token, "Removing");
        entry.cancel();
        let last = wait_for_exit(entry).await;
        info!(token, status = %last.status, size = self.len(), "Removed");
        Ok(last)
    }

    /// Looks up a bot by token.
    pub fn bot(&self, token: &str) -> Option<BotSnapshot> {
        self.bots.read().get(token).map(BotEntry::snapshot)
    }

    /// Returns a snapshot of every registered bot, in no particular order.
    ///
    /// The snapshot may be stale as soon as it is returned if other tasks are registering or
    /// removing bots concurrently.
    pub fn list(&self) -> Vec<BotSnapshot> {
        self.bots.read().values().map(BotEntry::snapshot).collect()
    }

    /// Subscribes to status changes of a registered bot.
    ///
    /// The receiver keeps working after the bot is removed and will observe its terminal status.
    pub fn watch_status(&self, token: &str) -> Option<watch::Receiver<BotStatus>> {
        self.bots.read().get(token).map(|entry| entry.status.subscribe())
    }

    /// Returns `true` if `token` is registered, whatever its status.
    pub fn contains(&self, token: &str) -> bool {
        self.bots.read().contains_key(token)
    }

    /// Number of registered bots, including ones that already finished on their own.
    pub fn len(&self) -> usize {
        self.bots.read().len()
    }

    /// Returns `true` if no bot is registered.
    pub fn is_empty(&self) -> bool {
        self.bots.read().is_empty()
    }

    /// Drains the registry: cancels every bot, then waits for all of them to exit.
    pub async fn stop_all(&self) {
        let drained = std::mem::take(&mut *self.bots.write());
        if drained.is_empty() {
            debug!("Nothing to stop");
            return;
        }

        let count = drained.len();
        info!(count, "Stopping all bots");

        let entries: Vec<BotEntry> = drained.into_values().collect();
        for entry in &entries {
            entry.cancel();
        }

        let finished = join_all(entries.into_iter().map(wait_for_exit)).await;
        let failed = finished.iter().filter(|last| last.status.is_failed()).count();
        for last in finished.iter().filter(|last| last.status.is_failed()) {
            warn!(token = %last.bot.token, status = %last.status, "Bot failed");
        }
        info!(count, failed, "All bots stopped");
    }
}

impl<R: Runner> Drop for BotManager<R> {
    fn drop(&mut self) {
        let bots = self.bots.get_mut();
        if bots.is_empty() {
            return;
        }
        debug!(count = bots.len(), "Manager dropped, cancelling remaining bots");
        for entry in bots.values() {
            entry.cancel();
        }
    }
}

/// Body of every bot task: run the bot, then publish its terminal status.
async fn supervise<R: Runner>(
    runner: Arc<R>,
    token: String,
    cancel: CancellationToken,
    status: Arc<watch::Sender<BotStatus>>,
) {
    status.send_if_modified(|s| s.advance(BotStatus::Running));
    debug!(%token, "Running");

    let outcome = AssertUnwindSafe(runner.run(cancel.clone(), &token))
        .catch_unwind()
        .await;

    let terminal = match outcome {
        Ok(Err(RunError::Cancelled)) if !cancel.is_cancelled() => BotStatus::Failed {
            reason: "cancelled without a cancellation request".to_string(),
        },
        Ok(Ok(())) | Ok(Err(RunError::Cancelled)) => BotStatus::Stopped,
        Ok(Err(RunError::Failed(e))) => BotStatus::Failed {
            reason: e.to_string(),
        },
        Err(panic) => BotStatus::Failed {
            reason: format!("panicked: {}", panic_message(panic.as_ref())),
        },
    };

    match &terminal {
        BotStatus::Failed { reason } => warn!(%token, %reason, "Run failed"),
        _ => debug!(%token, "Run finished"),
    }
    status.send_if_modified(|s| s.advance(terminal));
}

/// Awaits the completion handle of an already-detached entry.
async fn wait_for_exit(entry: BotEntry) -> BotSnapshot {
    let BotEntry {
        bot, done, status, ..
    } = entry;

    if let Err(e) = done.await {
        error!(token = %bot.token, error = %e, "Bot task aborted");
        status.send_if_modified(|s| {
            s.advance(BotStatus::Failed {
                reason: e.to_string(),
            })
        });
    }

    let status = status.borrow().clone();
    BotSnapshot { bot, status }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
