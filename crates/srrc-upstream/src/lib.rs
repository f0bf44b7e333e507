//! Client for the release feed that publishes the SRRC events asset.
//!
//! The feed is a GitHub-style releases API: the latest release of a
//! repository carries a JSON asset with the scraped events. This crate
//! resolves that release, locates the asset by exact name, downloads it and
//! parses it into [`srrc_core::RawEventRecord`]s.
//!
//! - [`ReleaseFeedClient`] - the production [`EventSource`]
//! - [`ReleaseFeedConfig`] - repository, asset name, timeouts and limits
//! - [`UpstreamError`] - typed failures, classified by [`FailureKind`]
//!
//! The client holds no state between calls and never retries; retry policy
//! belongs to the caller.

pub mod client;
pub mod error;
pub mod release;
pub mod source;

pub use client::{ReleaseFeedClient, ReleaseFeedConfig};
pub use error::{FailureKind, UpstreamError};
pub use release::{Release, ReleaseAsset};
pub use source::EventSource;
