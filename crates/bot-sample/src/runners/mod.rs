//! # Sample Runners
//!
//! Two concrete bots and a router that picks between them by token prefix:
//!
//! - [`HeartbeatRunner`] implements [`Runner`] directly.
//! - [`LegacyPoller`] implements the older [`LifecycleRunner`](bot_manager::LifecycleRunner)
//!   contract and is wrapped in a [`StartStopAdapter`].
//!
//! The manager holds exactly one runner, so [`TokenRouter`] dispatches each token to the runner
//! registered for its prefix.

mod heartbeat;
mod legacy_poller;

pub use heartbeat::{HeartbeatRunner, FAIL_PREFIX};
pub use legacy_poller::LegacyPoller;

use async_trait::async_trait;
use bot_manager::{RunError, Runner, StartStopAdapter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tokens with this prefix are run by the [`LegacyPoller`].
pub const LEGACY_PREFIX: &str = "legacy-";

/// Shortest tick period a sample runner accepts. Shorter periods, including zero, are raised
/// to this.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Dispatches each bot to a runner chosen by token prefix. First matching prefix wins.
pub struct TokenRouter {
    routes: Vec<(String, Arc<dyn Runner>)>,
    fallback: Arc<dyn Runner>,
}

impl TokenRouter {
    pub fn new(fallback: Arc<dyn Runner>) -> Self {
        Self {
            routes: Vec::new(),
            fallback,
        }
    }

    pub fn route(mut self, prefix: impl Into<String>, runner: Arc<dyn Runner>) -> Self {
        self.routes.push((prefix.into(), runner));
        self
    }

    fn pick(&self, token: &str) -> &Arc<dyn Runner> {
        self.routes
            .iter()
            .find(|(prefix, _)| token.starts_with(prefix.as_str()))
            .map(|(_, runner)| runner)
            .unwrap_or(&self.fallback)
    }
}

#[async_trait]
impl Runner for TokenRouter {
    async fn run(&self, cancel: CancellationToken, token: &str) -> Result<(), RunError> {
        self.pick(token).run(cancel, token).await
    }
}

/// The runner used by the binary: legacy pollers for `legacy-` tokens, heartbeats otherwise.
pub fn default_runner(period: Duration) -> Arc<dyn Runner> {
    Arc::new(
        TokenRouter::new(Arc::new(HeartbeatRunner::new(period))).route(
            LEGACY_PREFIX,
            Arc::new(StartStopAdapter::new(LegacyPoller::new(period))),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bot_manager::mock::MockRunner;

    #[tokio::test]
    async fn test_router_dispatches_by_prefix() {
        let legacy = MockRunner::new();
        let fallback = MockRunner::new();
        legacy.expect_run("legacy-1").exit_immediately();
        fallback.expect_run("plain").exit_immediately();

        let router = TokenRouter::new(Arc::new(fallback.clone()))
            .route(LEGACY_PREFIX, Arc::new(legacy.clone()));

        router.run(CancellationToken::new(), "legacy-1").await.unwrap();
        router.run(CancellationToken::new(), "plain").await.unwrap();

        assert_eq!(legacy.started(), vec!["legacy-1"]);
        assert_eq!(fallback.started(), vec!["plain"]);
        legacy.verify();
        fallback.verify();
    }
}
