//! # Mock Runner & Testing Guide
//!
//! [`MockRunner`] is a scripted [`Runner`] for tests. Each token can be given an expected
//! behaviour up front; the mock records which tokens were started and which ones returned, so
//! tests can assert on task-side effects after `remove` or `stop_all` come back.
//!
//! | Builder call | Behaviour of the run for that token |
//! |--------------|-------------------------------------|
//! | `return_ok()` | waits for cancellation, returns `Ok(())` |
//! | `return_err(msg)` | waits for cancellation, returns `RunError::Failed(msg)` |
//! | `exit_immediately()` | returns `Ok(())` without waiting |
//! | `fail_immediately(msg)` | returns `RunError::Failed(msg)` without waiting |
//! | `hang()` | ignores cancellation and never returns |
//!
//! Tokens with no expectation behave like `return_ok()`.
//!
//! ```rust
//! use bot_manager::mock::MockRunner;
//! use bot_manager::BotManager;
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = MockRunner::new();
//!     runner.expect_run("tok-A").return_err("lost connection");
//!
//!     let manager = BotManager::new(runner.clone());
//!     manager.register("bot", "tok-A").unwrap();
//!     runner.wait_started("tok-A").await;
//!
//!     let last = manager.remove("tok-A").await.unwrap();
//!     assert!(last.status.is_failed());
//!     assert!(runner.has_stopped("tok-A"));
//!     runner.verify();
//! }
//! ```

use crate::error::RunError;
use crate::runner::Runner;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Behavior {
    UntilCancelled(Option<String>),
    Immediately(Option<String>),
    Hang,
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior::UntilCancelled(None)
    }
}

#[derive(Default)]
struct MockState {
    expectations: HashMap<String, VecDeque<Behavior>>,
    started: Vec<String>,
    stopped: Vec<String>,
}

/// A scripted runner with per-token expectations and start/stop bookkeeping.
///
/// Cloning is cheap; all clones share the same expectations and records.
#[derive(Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
    start_signal: Arc<Notify>,
}

impl MockRunner {
    /// Creates a mock with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a run for `token`. Consumed in FIFO order if set more than once.
    pub fn expect_run(&self, token: impl Into<String>) -> RunExpectationBuilder {
        RunExpectationBuilder {
            token: token.into(),
            state: self.state.clone(),
        }
    }

    /// Tokens whose run has begun, in start order.
    pub fn started(&self) -> Vec<String> {
        self.state.lock().started.clone()
    }

    /// Tokens whose run has returned, in completion order.
    pub fn stopped(&self) -> Vec<String> {
        self.state.lock().stopped.clone()
    }

    pub fn has_started(&self, token: &str) -> bool {
        self.state.lock().started.iter().any(|t| t == token)
    }

    pub fn has_stopped(&self, token: &str) -> bool {
        self.state.lock().stopped.iter().any(|t| t == token)
    }

    /// Waits until the run for `token` has begun.
    pub async fn wait_started(&self, token: &str) {
        loop {
            let notified = self.start_signal.notified();
            if self.has_started(token) {
                return;
            }
            notified.await;
        }
    }

    /// Panics if any expectation was never consumed by a run.
    pub fn verify(&self) {
        let state = self.state.lock();
        let remaining: usize = state.expectations.values().map(VecDeque::len).sum();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }

    fn next_behavior(&self, token: &str) -> Behavior {
        let mut state = self.state.lock();
        state.started.push(token.to_string());
        state
            .expectations
            .get_mut(token)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default()
    }
}

#[async_trait]
impl Runner for MockRunner {
    async fn run(&self, cancel: CancellationToken, token: &str) -> Result<(), RunError> {
        let behavior = self.next_behavior(token);
        self.start_signal.notify_waiters();

        let failure = match behavior {
            Behavior::UntilCancelled(failure) => {
                cancel.cancelled().await;
                failure
            }
            Behavior::Immediately(failure) => failure,
            Behavior::Hang => std::future::pending().await,
        };

        self.state.lock().stopped.push(token.to_string());
        match failure {
            Some(msg) => Err(RunError::failed(msg)),
            None => Ok(()),
        }
    }
}

/// Builder for a single run expectation.
pub struct RunExpectationBuilder {
    token: String,
    state: Arc<Mutex<MockState>>,
}

impl RunExpectationBuilder {
    /// Run until cancelled, then succeed.
    pub fn return_ok(self) {
        self.push(Behavior::UntilCancelled(None));
    }

    /// Run until cancelled, then fail with `msg`.
    pub fn return_err(self, msg: impl Into<String>) {
        self.push(Behavior::UntilCancelled(Some(msg.into())));
    }

    /// Succeed right away without waiting for cancellation.
    pub fn exit_immediately(self) {
        self.push(Behavior::Immediately(None));
    }

    /// Fail right away with `msg`.
    pub fn fail_immediately(self, msg: impl Into<String>) {
        self.push(Behavior::Immediately(Some(msg.into())));
    }

    /// Never return, even after cancellation.
    pub fn hang(self) {
        self.push(Behavior::Hang);
    }

    fn push(self, behavior: Behavior) {
        self.state
            .lock()
            .expectations
            .entry(self.token)
            .or_default()
            .push_back(behavior);
    }
}
