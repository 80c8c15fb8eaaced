//! # Bot Identity & Registry Entry
//!
//! [`Bot`] is the public identity of a registered bot; the token is its unique key and the name
//! is a display label. [`BotSnapshot`] pairs that identity with the bot's current
//! [`BotStatus`] and is what the manager hands out to callers.
//!
//! `BotEntry` is the manager's private record: identity, cancellation handle, completion
//! handle, and the status channel shared with the spawned task.

use crate::status::BotStatus;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Identity of a registered bot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Bot {
    pub name: String,
    pub token: String,
}

impl Bot {
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
        }
    }
}

/// Point-in-time view of a bot: who it is and where it is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotSnapshot {
    #[serde(flatten)]
    pub bot: Bot,
    pub status: BotStatus,
}

impl BotSnapshot {
    pub fn name(&self) -> &str {
        &self.bot.name
    }

    pub fn token(&self) -> &str {
        &self.bot.token
    }
}

/// Per-registration state owned by the manager.
///
/// The status sender is shared with the spawned task, which is the only other party that
/// touches this entry.
pub(crate) struct BotEntry {
    pub(crate) bot: Bot,
    pub(crate) cancel: CancellationToken,
    pub(crate) done: JoinHandle<()>,
    pub(crate) status: Arc<watch::Sender<BotStatus>>,
}

impl BotEntry {
    pub(crate) fn snapshot(&self) -> BotSnapshot {
        BotSnapshot {
            bot: self.bot.clone(),
            status: self.status.borrow().clone(),
        }
    }

    /// Marks the entry as stopping and fires its cancellation token.
    ///
    /// Calling this on an entry whose task already finished is harmless.
    pub(crate) fn cancel(&self) {
        self.status
            .send_if_modified(|status| status.advance(BotStatus::Stopping));
        self.cancel.cancel();
    }
}
