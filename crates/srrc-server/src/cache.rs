//! In-memory event cache with atomic snapshot replacement.
//!
//! [`EventCache`] holds the current [`CacheSnapshot`] behind an `ArcSwap`.
//! Readers take a lock-free snapshot of the current pointer; a refresh
//! fetches and transforms the new list first and only then stores the new
//! snapshot in a single atomic swap. Old readers keep their old snapshot,
//! new readers get the new one, and nobody ever sees a mix of the two.
//!
//! # Usage
//!
//! ```ignore
//! use srrc_server::cache::EventCache;
//!
//! // Construct and perform the initial refresh
//! let cache = Arc::new(EventCache::load(source, 1).await);
//!
//! // Read at any time, even while a refresh is running
//! let events = cache.get_all();
//! let info = cache.cache_info();
//!
//! // Refresh never fails visibly; the outcome is for logs and callers that care
//! let outcome = cache.refresh().await;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use serde::Serialize;
use srrc_core::{Event, Timestamp, local_now, now_utc, transform_records};
use srrc_upstream::{EventSource, FailureKind};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::metrics;

/// Default cache lifetime, which is also the periodic refresh interval.
pub const DEFAULT_CACHE_DURATION_HOURS: u64 = 1;

/// Reported as `lastRefresh` until the first successful refresh.
pub const NEVER_REFRESHED: &str = "never";

/// An immutable, fully transformed list of events and the time it was built.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    pub events: Arc<Vec<Event>>,
    /// `None` until the first successful refresh.
    pub last_refresh: Option<Timestamp>,
}

impl CacheSnapshot {
    pub fn new(events: Vec<Event>, last_refresh: Timestamp) -> Self {
        Self {
            events: Arc::new(events),
            last_refresh: Some(last_refresh),
        }
    }

    pub fn upcoming_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_upcoming).count()
    }
}

/// Diagnostic view of the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub total_events: usize,
    pub upcoming_events: usize,
    /// RFC 3339 timestamp, or `"never"`.
    pub last_refresh: String,
    pub cache_duration_hours: u64,
}

/// What started a refresh cycle. Logged and used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Startup,
    Periodic,
    Manual,
}

impl RefreshTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Periodic => "periodic",
            Self::Manual => "manual",
        }
    }
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { total: usize, upcoming: usize },
    Failed { kind: FailureKind, message: String },
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Refreshed { .. })
    }
}

/// Read-mostly cache of the events published by an [`EventSource`].
pub struct EventCache {
    source: Arc<dyn EventSource>,
    snapshot: ArcSwap<CacheSnapshot>,
    /// Serializes refresh cycles; readers never touch it.
    refresh_lock: Mutex<()>,
    duration_hours: u64,
}

impl EventCache {
    /// Create an empty, never-refreshed cache.
    pub fn new(source: Arc<dyn EventSource>, duration_hours: u64) -> Self {
        Self {
            source,
            snapshot: ArcSwap::from_pointee(CacheSnapshot::default()),
            refresh_lock: Mutex::new(()),
            duration_hours,
        }
    }

    /// Create the cache and run the initial refresh.
    ///
    /// If the initial refresh fails the cache starts empty and waits for the
    /// next scheduled refresh.
    pub async fn load(source: Arc<dyn EventSource>, duration_hours: u64) -> Self {
        let cache = Self::new(source, duration_hours);
        info!("Loading initial event snapshot");
        cache.run_refresh(RefreshTrigger::Startup).await;
        cache
    }

    /// The current snapshot (lock-free).
    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.snapshot.load_full()
    }

    /// All cached events, in upstream order.
    pub fn get_all(&self) -> Arc<Vec<Event>> {
        let events = Arc::clone(&self.snapshot.load().events);
        tracing::debug!(count = events.len(), "Retrieving all events from cache");
        events
    }

    /// Cached events with `is_upcoming` set, in upstream order.
    pub fn get_upcoming(&self) -> Vec<Event> {
        let upcoming: Vec<Event> = self
            .snapshot
            .load()
            .events
            .iter()
            .filter(|e| e.is_upcoming)
            .cloned()
            .collect();
        tracing::debug!(count = upcoming.len(), "Retrieving upcoming events from cache");
        upcoming
    }

    pub fn cache_info(&self) -> CacheInfo {
        let snapshot = self.snapshot.load();
        let last_refresh = snapshot
            .last_refresh
            .as_ref()
            .and_then(|ts| ts.format_rfc3339().ok())
            .unwrap_or_else(|| NEVER_REFRESHED.to_string());

        CacheInfo {
            total_events: snapshot.events.len(),
            upcoming_events: snapshot.upcoming_count(),
            last_refresh,
            cache_duration_hours: self.duration_hours,
        }
    }

    /// Interval between periodic refreshes.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.duration_hours * 3600)
    }

    /// Fetch, transform and swap in a new snapshot. Entry point of the
    /// periodic refresh task; cycles are tagged `periodic`.
    ///
    /// Failures are logged and counted; the current snapshot is kept.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.run_refresh(RefreshTrigger::Periodic).await
    }

    /// Same as [`refresh`](Self::refresh), for manual triggers. Waits for a
    /// refresh already in progress, then runs a fresh cycle.
    pub async fn force_refresh(&self) -> RefreshOutcome {
        info!("Manual refresh triggered");
        self.run_refresh(RefreshTrigger::Manual).await
    }

    async fn run_refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let _guard = self.refresh_lock.lock().await;
        let started = Instant::now();
        let source = self.source.describe();

        info!(source = %source, trigger = trigger.as_str(), "Refreshing events");

        match self.source.fetch_events().await {
            Ok(records) => {
                let events = transform_records(records, local_now());
                let snapshot = CacheSnapshot::new(events, now_utc());
                let total = snapshot.events.len();
                let upcoming = snapshot.upcoming_count();

                self.snapshot.store(Arc::new(snapshot));

                let elapsed = started.elapsed();
                metrics::record_refresh_success(trigger.as_str(), total, upcoming, elapsed);
                info!(
                    total,
                    upcoming,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Successfully refreshed events"
                );
                RefreshOutcome::Refreshed { total, upcoming }
            }
            Err(e) => {
                let kind = e.kind();
                let elapsed = started.elapsed();
                metrics::record_refresh_failure(trigger.as_str(), kind.as_str(), elapsed);
                error!(
                    source = %source,
                    trigger = trigger.as_str(),
                    kind = %kind,
                    error = %e,
                    "Failed to refresh events, keeping cached snapshot"
                );
                RefreshOutcome::Failed {
                    kind,
                    message: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for EventCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCache")
            .field("source", &self.source.describe())
            .field("events", &self.snapshot.load().events.len())
            .field("duration_hours", &self.duration_hours)
            .finish()
    }
}
