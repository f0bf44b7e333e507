//! Periodic cache refresh.
//!
//! The refresh task is owned by whoever spawned it; the cache itself has no
//! notion of time.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::cache::{EventCache, RefreshOutcome};

/// Handle to the background refresh task. Dropping it stops the task.
#[derive(Debug)]
pub struct RefreshTaskHandle {
    handle: JoinHandle<()>,
}

impl RefreshTaskHandle {
    /// Stop the task. A refresh in flight is abandoned without touching the cache.
    pub fn shutdown(self) {
        tracing::info!("Stopping event refresh task");
        self.handle.abort();
    }
}

impl Drop for RefreshTaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a task refreshing `cache` every `period`, first at `now + period`.
pub fn spawn_refresh_task(cache: Arc<EventCache>, period: Duration) -> RefreshTaskHandle {
    let period = period.max(Duration::from_secs(1));

    let handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(period_secs = period.as_secs(), "Event refresh task started");

        loop {
            ticker.tick().await;
            match cache.refresh().await {
                RefreshOutcome::Refreshed { total, upcoming } => {
                    tracing::debug!(total, upcoming, "Scheduled refresh completed");
                }
                RefreshOutcome::Failed { kind, .. } => {
                    tracing::debug!(kind = %kind, "Scheduled refresh failed, next attempt on schedule");
                }
            }
        }
    });

    RefreshTaskHandle { handle }
}
