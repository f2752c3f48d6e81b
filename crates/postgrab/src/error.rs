//! Error types for the harvest and download pipelines.
//!
//! Only fatal conditions surface as errors to the caller. Per-post and
//! per-image failures during a download are logged and recorded in the
//! [`DownloadReport`](crate::download::DownloadReport) instead.

use std::path::PathBuf;

/// Faults raised by a [`PageNavigator`](crate::renderer::PageNavigator).
#[derive(thiserror::Error, Debug)]
pub enum BrowseError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {timeout_ms}ms waiting for `{selector}`")]
    Timeout { selector: String, timeout_ms: u64 },

    #[error("interaction with `{selector}` failed: {reason}")]
    Interaction { selector: String, reason: String },

    #[error("element handle {0} is no longer valid")]
    StaleElement(usize),

    #[error("browser error: {0}")]
    Browser(String),
}

impl BrowseError {
    /// True when the error only says the element never showed up in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors reading, validating or writing the manifest files.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("manifest file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("manifest is inconsistent: {urls} urls but {titles} titles")]
    CardinalityMismatch { urls: usize, titles: usize },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal conditions that end a harvest before a manifest is produced.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("feed page could not be loaded: {0}")]
    FeedUnavailable(#[source] BrowseError),

    #[error("post list never appeared on the feed page: {0}")]
    MissingPostMarker(#[source] BrowseError),

    #[error("failed to read the post list: {0}")]
    Scrape(#[source] BrowseError),
}

/// Convenience result type for navigator calls.
pub type BrowseResult<T> = Result<T, BrowseError>;
