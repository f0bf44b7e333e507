use async_trait::async_trait;
use srrc_core::RawEventRecord;

use crate::error::UpstreamError;

/// Anything that can produce the current list of raw events.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self) -> Result<Vec<RawEventRecord>, UpstreamError>;

    /// Short label for logs, e.g. `owner/repo:events.json`.
    fn describe(&self) -> String {
        "event source".to_string()
    }
}
