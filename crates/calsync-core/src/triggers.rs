//! Trigger sources: background loops that ask the engine to drain.
//!
//! The engine itself never decides *when* to sync; these collaborators do.
//! Manual and app-foreground triggers are plain `drain()` calls and need no
//! machinery here.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::engine::SyncEngine;

/// Default period for the background drain timer.
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Periodically kicks a drain.
///
/// Dropping the handle without calling shutdown leaves the loop running;
/// call [`DrainScheduler::shutdown_and_join`] for a clean stop.
pub struct DrainScheduler {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl DrainScheduler {
    pub fn spawn(engine: SyncEngine, every: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so the caller
            // controls the initial drain.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("scheduled drain");
                        engine.drain().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown_tx, join }
    }

    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

/// Drains once whenever connectivity comes back (false → true edge on the
/// injected reachability flag). Loss of connectivity triggers nothing; the
/// queue just accumulates until the next edge or timer tick.
pub struct ConnectivityWatcher {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ConnectivityWatcher {
    pub fn spawn(engine: SyncEngine, mut online: watch::Receiver<bool>) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut was_online = *online.borrow();

            loop {
                tokio::select! {
                    changed = online.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let now_online = *online.borrow();
                        if now_online && !was_online {
                            debug!("connectivity restored; draining");
                            // Kick rather than await so a long drain does
                            // not make the watcher deaf to shutdown.
                            let engine = engine.clone();
                            tokio::spawn(async move { engine.drain().await });
                        }
                        was_online = now_online;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown_tx, join }
    }

    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}
