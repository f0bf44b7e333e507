pub mod cache;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod observability;
pub mod scheduler;
pub mod server;

pub use cache::{CacheInfo, CacheSnapshot, EventCache, RefreshOutcome, RefreshTrigger};
pub use config::{AppConfig, CacheSettings, LoggingConfig, ServerConfig, UpstreamSettings};
pub use observability::init_tracing;
pub use scheduler::{RefreshTaskHandle, spawn_refresh_task};
pub use server::{AppState, ServerBuilder, SrrcServer, build_app};
