use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use srrc_core::{RawEventRecord, parse_raw_events};
use url::Url;

use crate::error::UpstreamError;
use crate::release::Release;
use crate::source::EventSource;

const GITHUB_API_BASE: &str = "https://api.github.com";
const RELEASE_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Configuration for the release feed client.
#[derive(Debug, Clone)]
pub struct ReleaseFeedConfig {
    /// Repository identifier, `owner/name`.
    pub repository: String,

    /// Exact name of the events asset in the latest release.
    pub asset_name: String,

    /// Base URL of the releases API (default: `https://api.github.com`).
    pub api_base_url: String,

    /// Timeout applied to each request (default: 30 seconds).
    pub request_timeout: Duration,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Maximum accepted response size in bytes (default: 10 MiB).
    pub max_response_size: usize,
}

impl ReleaseFeedConfig {
    /// Creates a configuration with default transport settings.
    pub fn new(repository: impl Into<String>, asset_name: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            asset_name: asset_name.into(),
            api_base_url: GITHUB_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            user_agent: "SRRC-Calendar-API/1.0".to_string(),
            max_response_size: 10 * 1024 * 1024,
        }
    }

    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }
}

/// Fetches the events asset from the latest release of a repository.
pub struct ReleaseFeedClient {
    http_client: reqwest::Client,
    config: ReleaseFeedConfig,
}

impl ReleaseFeedClient {
    pub fn new(config: ReleaseFeedConfig) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ReleaseFeedConfig {
        &self.config
    }

    /// Resolves the latest release, downloads the configured asset and
    /// parses it.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Transport`] on connection failures and timeouts
    /// - [`UpstreamError::Status`] when either request is not 2xx
    /// - [`UpstreamError::AssetNotFound`] when the release lacks the asset
    /// - [`UpstreamError::Parse`] on malformed JSON from either endpoint
    pub async fn fetch(&self) -> Result<Vec<RawEventRecord>, UpstreamError> {
        tracing::info!(
            repository = %self.config.repository,
            "Fetching events from release feed"
        );

        let release = self.latest_release().await?;

        let asset = release.find_asset(&self.config.asset_name).ok_or_else(|| {
            UpstreamError::AssetNotFound {
                repository: self.config.repository.clone(),
                asset_name: self.config.asset_name.clone(),
                release: release.tag_name.clone(),
            }
        })?;

        tracing::info!(
            asset = %asset.name,
            size = asset.size,
            release = %release.tag_name,
            "Found events asset"
        );

        let url = asset.browser_download_url.as_str();
        let body = self.get_body(url, "application/json").await?;
        let events = parse_raw_events(&body).map_err(|e| UpstreamError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        tracing::info!(count = events.len(), "Fetched events from release feed");
        Ok(events)
    }

    async fn latest_release(&self) -> Result<Release, UpstreamError> {
        let url = self.latest_release_url()?;
        tracing::debug!(url = %url, "Fetching latest release");

        let body = self.get_body(url.as_str(), RELEASE_MEDIA_TYPE).await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// `{api_base_url}/repos/{owner}/{name}/releases/latest`
    fn latest_release_url(&self) -> Result<Url, UpstreamError> {
        let invalid = || UpstreamError::InvalidUrl(self.config.api_base_url.clone());
        let mut url = Url::parse(&self.config.api_base_url).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments
                .pop_if_empty()
                .push("repos")
                .extend(self.config.repository.split('/'))
                .push("releases")
                .push("latest");
        }
        Ok(url)
    }

    async fn get_body(&self, url: &str, accept: &'static str) -> Result<Vec<u8>, UpstreamError> {
        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url, error = %e, "Release feed request failed");
                UpstreamError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let limit = self.config.max_response_size;
        if let Some(len) = response.content_length()
            && len > limit as u64
        {
            return Err(UpstreamError::ResponseTooLarge {
                url: url.to_string(),
                limit,
            });
        }

        let body = response.bytes().await.map_err(|e| UpstreamError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if body.len() > limit {
            return Err(UpstreamError::ResponseTooLarge {
                url: url.to_string(),
                limit,
            });
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl EventSource for ReleaseFeedClient {
    async fn fetch_events(&self) -> Result<Vec<RawEventRecord>, UpstreamError> {
        self.fetch().await
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.config.repository, self.config.asset_name)
    }
}

impl std::fmt::Debug for ReleaseFeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseFeedClient")
            .field("repository", &self.config.repository)
            .field("asset_name", &self.config.asset_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ReleaseFeedConfig::new("srrc/events-scraper", "events.json");
        assert_eq!(config.api_base_url, "https://api.github.com");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, "SRRC-Calendar-API/1.0");
        assert_eq!(config.max_response_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_latest_release_url() {
        let client =
            ReleaseFeedClient::new(ReleaseFeedConfig::new("srrc/events-scraper", "events.json"))
                .unwrap();
        assert_eq!(
            client.latest_release_url().unwrap().as_str(),
            "https://api.github.com/repos/srrc/events-scraper/releases/latest"
        );
    }

    #[test]
    fn test_latest_release_url_keeps_base_path() {
        let config = ReleaseFeedConfig::new("srrc/events-scraper", "events.json")
            .with_api_base_url("http://localhost:9000/github/");
        let client = ReleaseFeedClient::new(config).unwrap();
        assert_eq!(
            client.latest_release_url().unwrap().as_str(),
            "http://localhost:9000/github/repos/srrc/events-scraper/releases/latest"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ReleaseFeedConfig::new("srrc/events-scraper", "events.json")
            .with_api_base_url("not a url");
        let client = ReleaseFeedClient::new(config).unwrap();
        assert!(matches!(
            client.latest_release_url(),
            Err(UpstreamError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_describe() {
        let client =
            ReleaseFeedClient::new(ReleaseFeedConfig::new("srrc/events-scraper", "events.json"))
                .unwrap();
        assert_eq!(client.describe(), "srrc/events-scraper:events.json");
    }
}
