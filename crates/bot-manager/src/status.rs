//! # Bot Status
//!
//! The lifecycle state machine every registered bot moves through:
//!
//! ```text
//! Starting ──► Running ──► Stopping ──► Stopped
//!    │            │            │
//!    └────────────┴────────────┴──────► Failed
//! ```
//!
//! `Starting` is the instant after spawn, before the task has begun executing.
//! `Stopping` begins when the manager issues cancellation. `Stopped` and `Failed`
//! are terminal: once reached, the status never changes again.

use serde::Serialize;
use std::fmt;

/// Observable lifecycle state of a registered bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BotStatus {
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed { reason: String },
}

impl BotStatus {
    /// Returns `true` for `Stopped` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BotStatus::Stopped | BotStatus::Failed { .. })
    }

    /// Returns `true` only for `Failed`.
    pub fn is_failed(&self) -> bool {
        matches!(self, BotStatus::Failed { .. })
    }

    /// Moves to `next` if the state machine allows it.
    ///
    /// Returns whether the status changed, which makes it usable directly with
    /// [`tokio::sync::watch::Sender::send_if_modified`].
    pub fn advance(&mut self, next: BotStatus) -> bool {
        let allowed = match (&*self, &next) {
            (BotStatus::Starting, BotStatus::Running) => true,
            (BotStatus::Starting | BotStatus::Running, BotStatus::Stopping) => true,
            (current, BotStatus::Stopped | BotStatus::Failed { .. }) => !current.is_terminal(),
            _ => false,
        };
        if allowed {
            *self = next;
        }
        allowed
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotStatus::Starting => f.write_str("starting"),
            BotStatus::Running => f.write_str("running"),
            BotStatus::Stopping => f.write_str("stopping"),
            BotStatus::Stopped => f.write_str("stopped"),
            BotStatus::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}
