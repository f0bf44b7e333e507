use serde::{Deserialize, Serialize};
use srrc_upstream::ReleaseFeedConfig;
use std::{net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Where the events feed is published. Repository and asset name have no defaults.
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        // Upstream validations
        if self.upstream.repository.trim().is_empty() {
            return Err("upstream.repository is required".into());
        }
        let mut parts = self.upstream.repository.split('/');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !well_formed {
            return Err("upstream.repository must be in 'owner/name' form".into());
        }
        if self.upstream.asset_name.trim().is_empty() {
            return Err("upstream.asset_name is required".into());
        }
        if self.upstream.request_timeout_secs == 0 {
            return Err("upstream.request_timeout_secs must be > 0".into());
        }
        if self.upstream.max_response_bytes == 0 {
            return Err("upstream.max_response_bytes must be > 0".into());
        }
        // Cache validation
        if self.cache.duration_hours == 0 {
            return Err("cache.duration_hours must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.cache.duration_hours * 3600)
    }

    /// Client settings for the release feed.
    pub fn release_feed_config(&self) -> ReleaseFeedConfig {
        let upstream = &self.upstream;
        ReleaseFeedConfig::new(&upstream.repository, &upstream.asset_name)
            .with_api_base_url(&upstream.api_base_url)
            .with_request_timeout(Duration::from_secs(upstream.request_timeout_secs))
            .with_user_agent(&upstream.user_agent)
            .with_max_response_size(upstream.max_response_bytes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// `owner/name` of the repository whose latest release carries the feed.
    #[serde(default)]
    pub repository: String,
    /// Exact file name of the events asset.
    #[serde(default)]
    pub asset_name: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_api_base_url() -> String {
    "https://api.github.com".into()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "SRRC-Calendar-API/1.0".into()
}
fn default_max_response_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            repository: String::new(),
            asset_name: String::new(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Refresh period, also reported as `cacheDurationHours`.
    #[serde(default = "default_duration_hours")]
    pub duration_hours: u64,
}

fn default_duration_hours() -> u64 {
    crate::cache::DEFAULT_CACHE_DURATION_HOURS
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            duration_hours: default_duration_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "srrc-calendar.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., SRRC__UPSTREAM__REPOSITORY=org/repo
        builder = builder.add_source(
            Environment::with_prefix("SRRC")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
