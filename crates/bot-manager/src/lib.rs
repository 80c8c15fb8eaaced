//! # Bot Manager
//!
//! This crate manages a dynamic set of long-running, named "bot" tasks, each identified by a
//! unique token. It registers bots, runs one Tokio task per bot, tracks where each bot is in its
//! lifecycle, and tears bots down with a hard guarantee: when `remove` or `stop_all` return, the
//! affected tasks have actually exited.
//!
//! ## Architecture Overview
//!
//! 1. **Work Layer** ([`Runner`]) - what a bot does. Runs until its [`CancellationToken`] fires.
//! 2. **Registry Layer** ([`BotManager`]) - who is running. Owns the token → entry map.
//! 3. **Observation Layer** ([`BotSnapshot`], [`BotStatus`]) - what callers are allowed to see.
//!
//! Runners written against an older start/stop API plug in through [`StartStopAdapter`].
//!
//! ## Quick Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use bot_manager::{BotManager, ManagerError, RunError, Runner};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Runner for Echo {
//!     async fn run(&self, cancel: CancellationToken, token: &str) -> Result<(), RunError> {
//!         tracing::info!(token, "echo bot up");
//!         cancel.cancelled().await;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = BotManager::new(Echo);
//!
//!     manager.register("echo", "tok-1").unwrap();
//!     assert_eq!(
//!         manager.register("echo-2", "tok-1"),
//!         Err(ManagerError::DuplicateToken("tok-1".into()))
//!     );
//!     assert_eq!(manager.list().len(), 1);
//!
//!     manager.stop_all().await;
//!     assert!(manager.is_empty());
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - One Tokio task per registered bot; no data is shared between two bots' tasks
//! - The registry is the only shared mutable state, guarded by a single `RwLock`
//! - Cancellation is cooperative: a runner that ignores its token blocks `remove`/`stop_all`
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockRunner`](mock::MockRunner), a scripted runner that records
//! which bots started and stopped.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod entry;
pub mod error;
pub mod legacy;
pub mod manager;
pub mod mock;
pub mod runner;
pub mod status;
pub mod tracing;

pub use entry::{Bot, BotSnapshot};
pub use error::{BoxError, ManagerError, RunError};
pub use legacy::{LifecycleRunner, StartStopAdapter};
pub use manager::BotManager;
pub use runner::{Runner, RunnerFn};
pub use status::BotStatus;
