use async_trait::async_trait;
use bot_manager::mock::MockRunner;
use bot_manager::{
    BotManager, BotStatus, LifecycleRunner, ManagerError, RunError, Runner, RunnerFn,
    StartStopAdapter,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Bots that keep working for `teardown` after cancellation is requested.
fn slow_teardown(teardown: Duration) -> BotManager<impl Runner> {
    BotManager::new(RunnerFn::new(
        move |cancel: CancellationToken, _token: String| async move {
            cancel.cancelled().await;
            tokio::time::sleep(teardown).await;
            Ok::<_, RunError>(())
        },
    ))
}

#[tokio::test]
async fn test_register_duplicate_token_is_rejected() {
    let runner = MockRunner::new();
    let manager = BotManager::new(runner.clone());

    manager.register("bot1", "tok-A").unwrap();
    let err = manager.register("bot2", "tok-A").unwrap_err();
    assert_eq!(err, ManagerError::DuplicateToken("tok-A".into()));

    // The first registration is untouched.
    let bots = manager.list();
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].name(), "bot1");

    manager.stop_all().await;
    assert_eq!(runner.started(), vec!["tok-A"]);
}

#[tokio::test]
async fn test_remove_unknown_token_is_not_found() {
    let manager = BotManager::new(MockRunner::new());
    manager.register("bot1", "tok-A").unwrap();

    let err = manager.remove("tok-B").await.unwrap_err();
    assert_eq!(err, ManagerError::NotFound("tok-B".into()));
    assert_eq!(manager.len(), 1);

    manager.stop_all().await;
}

#[tokio::test]
async fn test_remove_twice_is_not_found() {
    let manager = BotManager::new(MockRunner::new());
    manager.register("bot1", "tok-A").unwrap();

    manager.remove("tok-A").await.unwrap();
    assert_eq!(
        manager.remove("tok-A").await,
        Err(ManagerError::NotFound("tok-A".into()))
    );
}

#[tokio::test]
async fn test_remove_waits_for_task_exit() {
    let exited = Arc::new(AtomicBool::new(false));
    let manager = BotManager::new(RunnerFn::new({
        let exited = exited.clone();
        move |cancel: CancellationToken, _token: String| {
            let exited = exited.clone();
            async move {
                cancel.cancelled().await;
                // Slow teardown after the signal.
                tokio::time::sleep(Duration::from_millis(50)).await;
                exited.store(true, Ordering::SeqCst);
                Ok::<_, RunError>(())
            }
        }
    }));

    manager.register("slow", "tok").unwrap();
    let last = manager.remove("tok").await.unwrap();

    assert!(exited.load(Ordering::SeqCst), "remove returned before the task exited");
    assert_eq!(last.status, BotStatus::Stopped);
    assert!(manager.bot("tok").is_none());
}

#[tokio::test]
async fn test_token_can_be_reused_after_remove() {
    let runner = MockRunner::new();
    let manager = BotManager::new(runner.clone());

    manager.register("first", "tok").unwrap();
    manager.remove("tok").await.unwrap();
    manager.register("second", "tok").unwrap();

    assert_eq!(manager.bot("tok").unwrap().name(), "second");
    manager.stop_all().await;
    assert_eq!(runner.started(), vec!["tok", "tok"]);
}

#[tokio::test]
async fn test_list_reflects_registers_minus_removes() {
    let manager = BotManager::new(MockRunner::new());

    for i in 0..10 {
        manager.register(format!("bot{i}"), format!("tok-{i}")).unwrap();
    }
    for i in 0..4 {
        manager.remove(&format!("tok-{i}")).await.unwrap();
    }

    let mut tokens: Vec<String> = manager
        .list()
        .into_iter()
        .map(|snapshot| snapshot.bot.token)
        .collect();
    tokens.sort();
    let expected: Vec<String> = (4..10).map(|i| format!("tok-{i}")).collect();
    assert_eq!(tokens, expected);

    manager.stop_all().await;
}

#[tokio::test]
async fn test_stop_all_waits_for_every_task() {
    let runner = MockRunner::new();
    let manager = BotManager::new(runner.clone());

    for i in 0..25 {
        manager.register(format!("bot{i}"), format!("tok-{i}")).unwrap();
    }
    for i in 0..25 {
        runner.wait_started(&format!("tok-{i}")).await;
    }

    manager.stop_all().await;

    assert!(manager.list().is_empty());
    assert_eq!(runner.stopped().len(), 25);
}

#[tokio::test]
async fn test_stop_all_cancels_everything_before_waiting() {
    let manager = slow_teardown(Duration::from_millis(100));
    for i in 0..10 {
        manager.register(format!("bot{i}"), format!("tok-{i}")).unwrap();
    }

    let started = Instant::now();
    manager.stop_all().await;
    let elapsed = started.elapsed();

    // Ten sequential teardowns would take a second.
    assert!(
        elapsed < Duration::from_millis(500),
        "stop_all took {elapsed:?}, teardowns ran one after another"
    );
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_remove_publishes_stopping_before_stopped() {
    let manager = Arc::new(slow_teardown(Duration::from_millis(100)));
    manager.register("bot", "tok").unwrap();

    let mut rx = manager.watch_status("tok").unwrap();
    rx.wait_for(|s| *s == BotStatus::Running).await.unwrap();

    let remove = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.remove("tok").await })
    };

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), BotStatus::Stopping);

    let last = remove.await.unwrap().unwrap();
    assert_eq!(last.status, BotStatus::Stopped);
    assert_eq!(*rx.borrow(), BotStatus::Stopped);
}

#[tokio::test]
async fn test_register_after_stop_all() {
    let manager = BotManager::new(MockRunner::new());
    manager.register("bot", "tok").unwrap();
    manager.stop_all().await;

    manager.register("bot", "tok").unwrap();
    assert_eq!(manager.len(), 1);
    manager.stop_all().await;
}

#[tokio::test]
async fn test_example_scenario() {
    let runner = MockRunner::new();
    let manager = BotManager::new(runner.clone());

    manager.register("bot1", "tok-A").unwrap();
    assert_eq!(
        manager.register("bot2", "tok-A"),
        Err(ManagerError::DuplicateToken("tok-A".into()))
    );
    manager.register("bot2", "tok-B").unwrap();
    assert_eq!(manager.list().len(), 2);

    let a = manager.bot("tok-A").expect("tok-A should be registered");
    assert_eq!(a.name(), "bot1");

    manager.remove("tok-A").await.unwrap();
    assert!(manager.bot("tok-A").is_none());
    assert!(runner.has_stopped("tok-A"));
    assert!(!runner.has_stopped("tok-B"));

    manager.stop_all().await;
    assert!(manager.list().is_empty());
    assert!(runner.has_stopped("tok-B"));
}

#[tokio::test]
async fn test_failure_reported_by_remove() {
    let runner = MockRunner::new();
    runner.expect_run("tok").return_err("connection reset");
    let manager = BotManager::new(runner.clone());

    manager.register("bot", "tok").unwrap();
    runner.wait_started("tok").await;

    let last = manager.remove("tok").await.unwrap();
    assert_eq!(
        last.status,
        BotStatus::Failed {
            reason: "connection reset".into()
        }
    );
    runner.verify();
}

#[tokio::test]
async fn test_self_terminated_bot_stays_registered() {
    let runner = MockRunner::new();
    runner.expect_run("bad").fail_immediately("invalid token");
    runner.expect_run("done").exit_immediately();
    let manager = BotManager::new(runner.clone());

    manager.register("bad", "bad").unwrap();
    manager.register("done", "done").unwrap();

    let mut bad = manager.watch_status("bad").unwrap();
    let mut done = manager.watch_status("done").unwrap();
    bad.wait_for(BotStatus::is_terminal).await.unwrap();
    done.wait_for(BotStatus::is_terminal).await.unwrap();

    assert_eq!(
        manager.bot("bad").unwrap().status,
        BotStatus::Failed {
            reason: "invalid token".into()
        }
    );
    assert_eq!(manager.bot("done").unwrap().status, BotStatus::Stopped);

    // Removing an already finished bot still succeeds.
    let last = manager.remove("bad").await.unwrap();
    assert!(last.status.is_failed());
    manager.stop_all().await;
    runner.verify();
}

#[tokio::test]
async fn test_status_watch_observes_stop() {
    let manager = BotManager::new(MockRunner::new());
    manager.register("bot", "tok").unwrap();

    let mut rx = manager.watch_status("tok").unwrap();
    rx.wait_for(|s| *s == BotStatus::Running).await.unwrap();

    manager.remove("tok").await.unwrap();
    assert_eq!(*rx.borrow_and_update(), BotStatus::Stopped);
}

#[tokio::test]
async fn test_remove_races_stop_all_on_same_token() {
    for _ in 0..50 {
        let runner = MockRunner::new();
        let manager = Arc::new(BotManager::new(runner.clone()));
        manager.register("bot", "tok").unwrap();

        let remove = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.remove("tok").await })
        };
        let stop_all = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.stop_all().await })
        };

        let removed = remove.await.unwrap();
        stop_all.await.unwrap();

        match removed {
            Ok(last) => assert_eq!(last.status, BotStatus::Stopped),
            Err(e) => assert_eq!(e, ManagerError::NotFound("tok".into())),
        }
        assert!(manager.is_empty());
        assert!(runner.has_stopped("tok"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_mix() {
    let runner = MockRunner::new();
    let manager = Arc::new(BotManager::new(runner.clone()));
    let removed = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..1000)
        .map(|i| {
            let manager = manager.clone();
            let removed = removed.clone();
            tokio::spawn(async move {
                // 100 distinct tokens, so registrations collide.
                let token = format!("tok-{}", i % 100);
                match i % 4 {
                    0 | 1 => {
                        let _ = manager.register(format!("bot{i}"), token);
                    }
                    2 => {
                        if manager.remove(&token).await.is_ok() {
                            removed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                    _ => {
                        for snapshot in manager.list() {
                            assert!(!snapshot.token().is_empty());
                        }
                        let _ = manager.bot(&token);
                    }
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    // Every token that is still registered maps to exactly one live entry.
    let remaining = manager.list();
    let mut tokens: Vec<&str> = remaining.iter().map(|s| s.token()).collect();
    tokens.sort();
    tokens.dedup();
    assert_eq!(tokens.len(), remaining.len());

    manager.stop_all().await;
    assert!(manager.is_empty());

    // One start per successful registration, one stop per start.
    let started = runner.started().len();
    assert_eq!(started, removed.load(Ordering::SeqCst) + remaining.len());
    assert_eq!(runner.stopped().len(), started);
}

// --- Start/stop adapter ---

#[derive(Default)]
struct LegacyBot {
    events: Mutex<Vec<String>>,
}

#[async_trait]
impl LifecycleRunner for LegacyBot {
    async fn start(&self, token: &str) -> Result<(), RunError> {
        self.events.lock().push(format!("start:{token}"));
        Ok(())
    }

    async fn stop(&self, token: &str) -> Result<(), RunError> {
        self.events.lock().push(format!("stop:{token}"));
        Ok(())
    }
}

#[tokio::test]
async fn test_start_stop_adapter_under_manager() {
    let manager = BotManager::new(StartStopAdapter::new(LegacyBot::default()));

    manager.register("old", "tok-old").unwrap();
    let mut rx = manager.watch_status("tok-old").unwrap();
    rx.wait_for(|s| *s == BotStatus::Running).await.unwrap();

    let last = manager.remove("tok-old").await.unwrap();
    assert_eq!(last.status, BotStatus::Stopped);
    assert_eq!(
        *manager.runner().inner().events.lock(),
        vec!["start:tok-old".to_string(), "stop:tok-old".to_string()]
    );
}

#[tokio::test]
async fn test_snapshot_serializes_flat() {
    let runner = MockRunner::new();
    runner.expect_run("tok").fail_immediately("boom");
    let manager = BotManager::new(runner);

    manager.register("bot", "tok").unwrap();
    let mut rx = manager.watch_status("tok").unwrap();
    rx.wait_for(BotStatus::is_terminal).await.unwrap();

    let json = serde_json::to_value(manager.bot("tok").unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "bot",
            "token": "tok",
            "status": { "state": "failed", "reason": "boom" }
        })
    );
    manager.stop_all().await;
}
