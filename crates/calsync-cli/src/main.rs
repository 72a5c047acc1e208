//! Demo binary: drives the sync engine against a flaky in-process remote.
//!
//! Run with `RUST_LOG=calsync_core=debug` to watch the retry decisions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::watch;

use calsync_core::{
    BackoffPolicy, EngineEvent, JsonFileStore, Priority, RemoteCalendar, RemoteExecutor,
    SyncConfig, SyncEngine, SyncError, SyncTask, TaskKind,
};
use calsync_core::triggers::ConnectivityWatcher;

/// Remote that fails a scripted number of times per call site, then starts
/// flipping a coin — enough misbehavior to exercise backoff and the
/// failure log.
struct FlakyCalendar {
    guaranteed_failures: AtomicU32,
}

impl FlakyCalendar {
    fn new(guaranteed_failures: u32) -> Self {
        Self {
            guaranteed_failures: AtomicU32::new(guaranteed_failures),
        }
    }

    async fn attempt(&self, what: &str, subject: &str) -> Result<(), SyncError> {
        // Simulate a slow network call.
        tokio::time::sleep(Duration::from_millis(150)).await;

        let left = self.guaranteed_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.guaranteed_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(SyncError::transient(format!(
                "{what} {subject}: connection reset (left={left})"
            )));
        }
        if rand::thread_rng().gen_bool(0.2) {
            return Err(SyncError::transient(format!("{what} {subject}: timeout")));
        }
        println!("remote: {what} {subject} ok");
        Ok(())
    }
}

#[async_trait]
impl RemoteCalendar for FlakyCalendar {
    async fn create_event(&self, subject_id: &str, _payload: &[u8]) -> Result<(), SyncError> {
        self.attempt("create", subject_id).await
    }

    async fn update_event(&self, subject_id: &str, _payload: &[u8]) -> Result<(), SyncError> {
        self.attempt("update", subject_id).await
    }

    async fn delete_event(&self, subject_id: &str) -> Result<(), SyncError> {
        self.attempt("delete", subject_id).await
    }

    async fn full_sync(&self, subject_id: &str) -> Result<(), SyncError> {
        self.attempt("full_sync", subject_id).await
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // (A) Wire the engine: file-backed store, flaky remote, short backoff
    // cap so the demo finishes quickly.
    let store = Arc::new(JsonFileStore::new(
        std::env::temp_dir().join("calsync-demo/queue.json"),
    ));
    let remote = Arc::new(FlakyCalendar::new(2));
    let executor = Arc::new(RemoteExecutor::new(remote));
    let config = SyncConfig {
        backoff: BackoffPolicy::new(Duration::from_secs(4)),
        ..Default::default()
    };
    let engine = SyncEngine::restore(config, store, executor).await;
    let mut events = engine.subscribe();

    // (B) Pretend the platform reported connectivity coming back.
    let (online_tx, online_rx) = watch::channel(false);
    let watcher = ConnectivityWatcher::spawn(engine.clone(), online_rx);

    // (C) Queue some local edits.
    let payload = serde_json::to_vec(&serde_json::json!({ "title": "standup" })).unwrap();
    engine
        .enqueue(SyncTask::new(TaskKind::Create, "event-1", payload))
        .await;
    engine
        .enqueue(SyncTask::new(TaskKind::Update, "event-2", vec![]))
        .await;
    engine
        .enqueue(
            SyncTask::new(TaskKind::FullSync, "primary-calendar", vec![])
                .with_priority(Priority::High),
        )
        .await;

    online_tx.send(true).unwrap();

    // (D) Watch events until the drain settles.
    loop {
        match events.recv().await.expect("engine gone") {
            EngineEvent::TaskSucceeded { id } => println!("synced {id}"),
            EngineEvent::TaskRetrying { id, attempt, kind } => {
                println!("retrying {id} (attempt {attempt}, {kind:?})")
            }
            EngineEvent::TaskExhausted { id, .. } => println!("gave up on {id}"),
            EngineEvent::DrainCompleted { at } => {
                println!("drain completed at {at}");
                break;
            }
        }
    }

    let stats = engine.statistics().await;
    println!(
        "pending={} active={} failed={}",
        stats.pending_count, stats.active_count, stats.failed_count
    );
    for failure in engine.failure_log().await {
        println!(
            "failure: {} {} ({})",
            failure.subject_id,
            failure.error,
            failure.error_kind.hint()
        );
    }

    watcher.shutdown_and_join().await;
}
