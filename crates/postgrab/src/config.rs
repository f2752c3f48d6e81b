//! Site profile, timings and pipeline configuration.
//!
//! Defaults target the Naver Post mobile site. A JSON profile file can
//! override any subset of the fields:
//!
//! ```json
//! { "site": { "content_marker": "cdn-images" }, "timings": { "download_pause_ms": 250 } }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default manifest file holding one post URL per line.
pub const DEFAULT_URLS_FILE: &str = "collection_urls.txt";

/// Default manifest file holding one post title per line.
pub const DEFAULT_TITLES_FILE: &str = "collection_titles.txt";

/// Selectors and patterns describing one site's markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Origin that relative post links are resolved against.
    pub base_url: String,
    /// Anchor elements linking to individual posts.
    pub link_selector: String,
    /// Title element looked up inside each post link.
    pub title_selector: String,
    /// Accepted post hrefs start with this path (and query) prefix.
    pub post_path_prefix: String,
    /// The "load more" control on the feed.
    pub load_more_selector: String,
    /// Image elements on a post page.
    pub image_selector: String,
    /// Only image sources containing this substring are post content.
    pub content_marker: String,
    /// Regex whose first capture group is a post id, used when a title is empty.
    pub post_id_pattern: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "https://m.post.naver.com".to_string(),
            link_selector: "a.link_end".to_string(),
            title_selector: "strong.tit_feed".to_string(),
            post_path_prefix: "/viewer/postView.naver?".to_string(),
            load_more_selector: "button.btn_lst_more".to_string(),
            image_selector: "img".to_string(),
            content_marker: "post-phinf".to_string(),
            post_id_pattern: r"volumeNo=(\d+)".to_string(),
        }
    }
}

/// Fixed waits and timeouts, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// How long the feed may take to show its first post link.
    pub initial_wait_ms: u64,
    /// How long to wait for the load-more control before calling the feed exhausted.
    pub load_more_timeout_ms: u64,
    /// Settle time after each load-more click.
    pub load_more_settle_ms: u64,
    /// Settle time after opening a post page.
    pub post_settle_ms: u64,
    /// Pause after every image download.
    pub download_pause_ms: u64,
    /// Per-request HTTP timeout.
    pub http_timeout_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            initial_wait_ms: 30_000,
            load_more_timeout_ms: 3_000,
            load_more_settle_ms: 1_000,
            post_settle_ms: 3_000,
            download_pause_ms: 500,
            http_timeout_ms: 30_000,
        }
    }
}

impl Timings {
    /// Timings with every wait set to zero, for scripted pages.
    pub fn immediate() -> Self {
        Self {
            initial_wait_ms: 0,
            load_more_timeout_ms: 0,
            load_more_settle_ms: 0,
            post_settle_ms: 0,
            download_pause_ms: 0,
            http_timeout_ms: 5_000,
        }
    }

    pub fn initial_wait(&self) -> Duration {
        Duration::from_millis(self.initial_wait_ms)
    }

    pub fn load_more_timeout(&self) -> Duration {
        Duration::from_millis(self.load_more_timeout_ms)
    }

    pub fn load_more_settle(&self) -> Duration {
        Duration::from_millis(self.load_more_settle_ms)
    }

    pub fn post_settle(&self) -> Duration {
        Duration::from_millis(self.post_settle_ms)
    }

    pub fn download_pause(&self) -> Duration {
        Duration::from_millis(self.download_pause_ms)
    }
}

/// Contents of a `--profile` JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFile {
    pub site: SiteProfile,
    pub timings: Timings,
}

impl ProfileFile {
    /// Load a profile, or the built-in defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid profile {}", path.display()))
    }
}

/// Locations of the two parallel manifest files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPaths {
    pub urls: PathBuf,
    pub titles: PathBuf,
}

impl Default for ManifestPaths {
    fn default() -> Self {
        Self {
            urls: PathBuf::from(DEFAULT_URLS_FILE),
            titles: PathBuf::from(DEFAULT_TITLES_FILE),
        }
    }
}

/// Everything the pagination driver needs.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub feed_url: String,
    pub site: SiteProfile,
    pub timings: Timings,
    /// Consecutive non-timeout click failures tolerated before giving up.
    pub max_transient_retries: u32,
    /// Stop clicking load-more after this many successful clicks.
    pub max_load_more_clicks: Option<u32>,
}

impl HarvestConfig {
    pub fn new(feed_url: impl Into<String>, profile: ProfileFile) -> Self {
        Self {
            feed_url: feed_url.into(),
            site: profile.site,
            timings: profile.timings,
            max_transient_retries: 2,
            max_load_more_clicks: None,
        }
    }
}

/// Everything the download orchestrator needs.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub site: SiteProfile,
    pub timings: Timings,
    /// Prefix folder names with the zero-padded manifest ordinal.
    pub indexed: bool,
    /// Directory that post folders are created under.
    pub output_dir: PathBuf,
}

impl DownloadConfig {
    pub fn new(profile: ProfileFile, indexed: bool, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            site: profile.site,
            timings: profile.timings,
            indexed,
            output_dir: output_dir.into(),
        }
    }
}
