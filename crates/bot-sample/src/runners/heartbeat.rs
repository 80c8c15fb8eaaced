use super::MIN_PERIOD;
use async_trait::async_trait;
use bot_manager::{RunError, Runner};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Tokens with this prefix fail right after their first beat.
pub const FAIL_PREFIX: &str = "fail-";

/// A bot that logs a heartbeat on a fixed period until it is cancelled.
#[derive(Debug, Clone)]
pub struct HeartbeatRunner {
    period: Duration,
}

impl HeartbeatRunner {
    /// Creates a runner that beats every `period`, at least [`MIN_PERIOD`].
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
        }
    }
}

#[async_trait]
impl Runner for HeartbeatRunner {
    async fn run(&self, cancel: CancellationToken, token: &str) -> Result<(), RunError> {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut beats: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(token, beats, "Heartbeat stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    beats += 1;
                    info!(token, beats, "Heartbeat");
                    if token.starts_with(FAIL_PREFIX) {
                        return Err(RunError::failed(format!(
                            "token rejected after {beats} heartbeat(s)"
                        )));
                    }
                }
            }
        }
    }
}
