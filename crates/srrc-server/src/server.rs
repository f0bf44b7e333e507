use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use srrc_upstream::{EventSource, ReleaseFeedClient};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    cache::EventCache,
    config::AppConfig,
    handlers,
    middleware::{self as app_middleware, RequestId},
    scheduler::spawn_refresh_task,
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<EventCache>,
}

pub struct SrrcServer {
    addr: SocketAddr,
    app: Router,
    cache: Arc<EventCache>,
    refresh_period: Duration,
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/api/v1/events", get(handlers::list_events))
        .route("/api/v1/events/upcoming", get(handlers::list_upcoming_events))
        .route("/api/v1/events/refresh", post(handlers::refresh_events))
        .route("/api/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Matched routes only, so the path label is the route template
        .route_layer(middleware::from_fn(app_middleware::http_metrics))
        .fallback(handlers::not_found)
        // Layers added last run first: request id -> cors -> trace -> compression -> body limit
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.as_str().to_string())
                        .unwrap_or_default();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(app_middleware::request_id))
        .with_state(state)
}

pub struct ServerBuilder {
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the server. Runs the initial refresh before returning.
    pub async fn build(self) -> anyhow::Result<SrrcServer> {
        let source: Arc<dyn EventSource> =
            Arc::new(ReleaseFeedClient::new(self.config.release_feed_config())?);

        let cache = Arc::new(EventCache::load(source, self.config.cache.duration_hours).await);
        let app = build_app(
            AppState {
                cache: Arc::clone(&cache),
            },
            &self.config,
        );

        Ok(SrrcServer {
            addr: self.config.addr(),
            app,
            cache,
            refresh_period: self.config.refresh_period(),
        })
    }
}

impl SrrcServer {
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Serve until Ctrl+C or SIGTERM, refreshing the cache in the background.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);

        let refresh_task = spawn_refresh_task(Arc::clone(&self.cache), self.refresh_period);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        refresh_task.shutdown();
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
