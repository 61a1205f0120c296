//! Periodic synchronization

mod reconciler;

pub use reconciler::{MemberUpdate, Reconciler, SyncReport};

use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use tokio::time::{interval_at, Duration, Instant};

/// Drives the reconciler: one pass at startup, then one per interval
pub struct Scheduler {
    interval: Duration,
    reconciler: Arc<Reconciler>,
    running: Arc<RwLock<bool>>,
    shutdown: Notify,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(interval_secs: u64, reconciler: Arc<Reconciler>) -> Arc<Self> {
        Arc::new(Self {
            interval: Duration::from_secs(interval_secs.max(1)),
            reconciler,
            running: Arc::new(RwLock::new(false)),
            shutdown: Notify::new(),
        })
    }

    /// Run until stopped
    pub async fn start(self: Arc<Self>) {
        *self.running.write().await = true;
        tracing::info!(interval_secs = self.interval.as_secs(), "Scheduler started");

        let report = self.reconciler.sync_guild().await;
        tracing::info!(
            updated = report.updated,
            "Initial updated members: {}",
            report.updated
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.reconciler.sync_guild().await;
                    if report.is_ok() {
                        tracing::info!(
                            updated = report.updated,
                            "Periodic updated members: {}",
                            report.updated
                        );
                    }
                }
                _ = self.shutdown.notified() => {}
            }

            if !*self.running.read().await {
                break;
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Stop after the current pass
    pub async fn stop(&self) {
        *self.running.write().await = false;
        self.shutdown.notify_one();
    }
}
