/// Errors that can occur while fetching events from the release feed.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// The configured API base URL cannot carry a path.
    #[error("Invalid release feed URL: {0}")]
    InvalidUrl(String),

    /// Connection, timeout or body read failure.
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The upstream answered with a non-success status code.
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The latest release does not carry the configured asset.
    #[error("Asset '{asset_name}' not found in release {release} of {repository}")]
    AssetNotFound {
        repository: String,
        asset_name: String,
        release: String,
    },

    /// A response body was not the expected JSON.
    #[error("Failed to parse response from {url}: {message}")]
    Parse { url: String, message: String },

    /// A response body exceeded the configured size limit.
    #[error("Response from {url} exceeds maximum size of {limit} bytes")]
    ResponseTooLarge { url: String, limit: usize },
}

impl UpstreamError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Client(_) | Self::InvalidUrl(_) => FailureKind::Configuration,
            Self::Transport { .. } => FailureKind::Transport,
            Self::Status { .. } => FailureKind::HttpStatus,
            Self::AssetNotFound { .. } => FailureKind::AssetNotFound,
            Self::Parse { .. } => FailureKind::Parse,
            Self::ResponseTooLarge { .. } => FailureKind::TooLarge,
        }
    }
}

/// Failure classification used in logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Configuration,
    Transport,
    HttpStatus,
    AssetNotFound,
    Parse,
    TooLarge,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::HttpStatus => "http_status",
            Self::AssetNotFound => "asset_not_found",
            Self::Parse => "parse",
            Self::TooLarge => "too_large",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_not_found_message_names_repository_and_asset() {
        let err = UpstreamError::AssetNotFound {
            repository: "srrc/events-scraper".into(),
            asset_name: "events.json".into(),
            release: "v2024.11.07".into(),
        };
        assert_eq!(
            err.to_string(),
            "Asset 'events.json' not found in release v2024.11.07 of srrc/events-scraper"
        );
        assert_eq!(err.kind(), FailureKind::AssetNotFound);
    }

    #[test]
    fn kinds_are_distinguishable() {
        let transport = UpstreamError::Transport {
            url: "u".into(),
            message: "timed out".into(),
        };
        let status = UpstreamError::Status {
            url: "u".into(),
            status: 502,
        };
        let parse = UpstreamError::Parse {
            url: "u".into(),
            message: "eof".into(),
        };
        assert_eq!(transport.kind().as_str(), "transport");
        assert_eq!(status.kind().as_str(), "http_status");
        assert_eq!(parse.kind().as_str(), "parse");
        assert_ne!(transport.kind(), FailureKind::AssetNotFound);
    }
}
