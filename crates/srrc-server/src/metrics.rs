//! Prometheus metrics for the calendar API.
//!
//! This module provides:
//! - HTTP request metrics (count, latency)
//! - Refresh cycle metrics (outcome counts, duration)
//! - Cache size gauges (all and upcoming events)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

    // Refresh metrics
    pub const REFRESH_TOTAL: &str = "srrc_refresh_total";
    pub const REFRESH_DURATION_SECONDS: &str = "srrc_refresh_duration_seconds";

    // Cache metrics
    pub const CACHED_EVENTS: &str = "srrc_cached_events";
}

/// Initialize the Prometheus metrics exporter.
///
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        tracing::debug!("Prometheus metrics already initialized");
        return false;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROMETHEUS_HANDLE.set(handle).is_err() {
                tracing::warn!("Failed to store Prometheus handle (already set)");
                return false;
            }

            tracing::info!("Prometheus metrics initialized");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder");
            false
        }
    }
}

/// Render all metrics in Prometheus text format.
///
/// Returns `None` if metrics were not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|handle| handle.render())
}

// =============================================================================
// HTTP Metrics
// =============================================================================

/// Record an HTTP request. `path` is the matched route template.
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    counter!(
        names::HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status_class" => status_class(status)
    )
    .increment(1);

    histogram!(
        names::HTTP_REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration.as_secs_f64());
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

// =============================================================================
// Refresh Metrics
// =============================================================================

/// Record a successful refresh and the size of the new snapshot.
pub fn record_refresh_success(
    trigger: &'static str,
    total: usize,
    upcoming: usize,
    duration: Duration,
) {
    counter!(
        names::REFRESH_TOTAL,
        "trigger" => trigger,
        "outcome" => "success",
        "kind" => "none"
    )
    .increment(1);
    histogram!(names::REFRESH_DURATION_SECONDS, "outcome" => "success")
        .record(duration.as_secs_f64());

    gauge!(names::CACHED_EVENTS, "scope" => "all").set(total as f64);
    gauge!(names::CACHED_EVENTS, "scope" => "upcoming").set(upcoming as f64);
}

/// Record a failed refresh. The cache gauges keep their previous values.
pub fn record_refresh_failure(trigger: &'static str, kind: &str, duration: Duration) {
    counter!(
        names::REFRESH_TOTAL,
        "trigger" => trigger,
        "outcome" => "failure",
        "kind" => kind.to_string()
    )
    .increment(1);
    histogram!(names::REFRESH_DURATION_SECONDS, "outcome" => "failure")
        .record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(200), "2xx");
        assert_eq!(status_class(204), "2xx");
        assert_eq!(status_class(304), "3xx");
        assert_eq!(status_class(404), "4xx");
        assert_eq!(status_class(503), "5xx");
        assert_eq!(status_class(101), "other");
    }

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics();
        assert!(!init_metrics());

        record_refresh_success("periodic", 10, 4, Duration::from_millis(12));
        record_refresh_failure("manual", "transport", Duration::from_millis(3));

        let rendered = render_metrics().expect("metrics initialized");
        assert!(rendered.contains(names::REFRESH_TOTAL));
        assert!(rendered.contains(names::CACHED_EVENTS));
        assert!(rendered.contains("trigger=\"periodic\""));
        assert!(rendered.contains("kind=\"transport\""));
    }
}
