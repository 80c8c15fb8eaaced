//! # Manager Errors
//!
//! This module defines the error types used throughout the bot manager.
//! Registry-shape failures ([`ManagerError`]) are kept apart from the outcome of a
//! bot's own run ([`RunError`]): the former are returned synchronously by the
//! manager, the latter only ever shows up in a bot's [`BotStatus`](crate::BotStatus).

/// Errors returned by [`BotManager`](crate::BotManager) operations.
///
/// These never leave the registry partially mutated.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ManagerError {
    /// A bot with this token is already registered.
    #[error("Duplicate token: {0}")]
    DuplicateToken(String),
    /// No bot with this token is registered.
    #[error("Bot not found: {0}")]
    NotFound(String),
}

/// The boxed error a runner reports when it stops abnormally.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a [`Runner`](crate::Runner) that did not finish with `Ok(())`.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The run observed cancellation and bailed out. Counts as a graceful stop only when the
    /// manager actually requested cancellation; otherwise the bot is reported as failed.
    #[error("Run cancelled")]
    Cancelled,
    /// The run stopped abnormally.
    #[error("{0}")]
    Failed(BoxError),
}

impl RunError {
    /// Builds a [`RunError::Failed`] from a plain message.
    pub fn failed(msg: impl Into<String>) -> Self {
        RunError::Failed(msg.into().into())
    }

    /// Returns `true` if this error marks a graceful, cancellation-driven stop.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunError::Cancelled)
    }
}

impl From<BoxError> for RunError {
    fn from(e: BoxError) -> Self {
        RunError::Failed(e)
    }
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        RunError::Failed(Box::new(e))
    }
}
