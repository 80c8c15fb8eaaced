use super::MIN_PERIOD;
use async_trait::async_trait;
use bot_manager::{LifecycleRunner, RunError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Poll {
    cancel: CancellationToken,
    handle: JoinHandle<u64>,
}

/// A start/stop style bot: `start` spawns a background polling loop, `stop` tears it down.
///
/// Run it under a manager through [`StartStopAdapter`](bot_manager::StartStopAdapter).
pub struct LegacyPoller {
    period: Duration,
    polls: Mutex<HashMap<String, Poll>>,
}

impl LegacyPoller {
    /// Creates a poller that polls every `period`, at least [`MIN_PERIOD`].
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            polls: Mutex::new(HashMap::new()),
        }
    }

    /// Number of polling loops currently started.
    pub fn active(&self) -> usize {
        self.polls.lock().len()
    }
}

#[async_trait]
impl LifecycleRunner for LegacyPoller {
    async fn start(&self, token: &str) -> Result<(), RunError> {
        let mut polls = self.polls.lock();
        if polls.contains_key(token) {
            return Err(RunError::failed(format!("poller {token} already started")));
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            token.to_string(),
            self.period,
            cancel.clone(),
        ));
        polls.insert(token.to_string(), Poll { cancel, handle });
        Ok(())
    }

    async fn stop(&self, token: &str) -> Result<(), RunError> {
        let poll = self
            .polls
            .lock()
            .remove(token)
            .ok_or_else(|| RunError::failed(format!("poller {token} is not running")))?;

        poll.cancel.cancel();
        let count = poll.handle.await.map_err(|e| RunError::Failed(Box::new(e)))?;
        debug!(token, polls = count, "Poller stopped");
        Ok(())
    }
}

async fn poll_loop(token: String, period: Duration, cancel: CancellationToken) -> u64 {
    let mut ticker = tokio::time::interval(period);
    let mut count = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return count,
            _ = ticker.tick() => {
                count += 1;
                debug!(%token, count, "Polled");
            }
        }
    }
}
