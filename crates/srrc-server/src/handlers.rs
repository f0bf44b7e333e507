use axum::{
    extract::State,
    http::{HeaderValue, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use srrc_api::{ApiError, ApiResponse};
use srrc_core::Event;

use crate::cache::{CacheInfo, RefreshOutcome};
use crate::server::AppState;

pub const SERVICE_NAME: &str = "SRRC Calendar API";

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub cache: CacheInfo,
}

/// `GET /api/v1/events`
pub async fn list_events(State(state): State<AppState>) -> ApiResponse<Vec<Event>> {
    let events = state.cache.get_all().to_vec();
    let message = format!("Successfully retrieved {} events", events.len());
    ApiResponse::ok(events, message)
}

/// `GET /api/v1/events/upcoming`
pub async fn list_upcoming_events(State(state): State<AppState>) -> ApiResponse<Vec<Event>> {
    let events = state.cache.get_upcoming();
    let message = format!("Successfully retrieved {} upcoming events", events.len());
    ApiResponse::ok(events, message)
}

/// `GET /api/v1/health`
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    let body = HealthStatus {
        status: "UP",
        service: SERVICE_NAME,
        cache: state.cache.cache_info(),
    };
    ApiResponse::ok(body, "Service is healthy")
}

/// `POST /api/v1/events/refresh`
///
/// Runs a refresh cycle before answering. A failed cycle keeps the previous
/// snapshot and is only visible in logs and metrics. Never cached by clients.
pub async fn refresh_events(State(state): State<AppState>) -> ApiResponse<&'static str> {
    if let RefreshOutcome::Failed { kind, message } = state.cache.force_refresh().await {
        tracing::warn!(kind = %kind, error = %message, "Manual refresh kept the previous snapshot");
    }
    ApiResponse::ok("Refresh initiated", "Events refresh completed successfully")
        .with_header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
}

/// `GET /metrics`
pub async fn metrics() -> Response {
    match crate::metrics::render_metrics() {
        Some(body) => (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )],
            body,
        )
            .into_response(),
        None => ApiError::unavailable("Metrics recorder is not installed").into_response(),
    }
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
