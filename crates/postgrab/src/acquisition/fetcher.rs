//! Fetch one image and write it to disk.
//!
//! A failure here never propagates: it is logged and reported as a
//! [`FetchOutcome`] so the caller's batch keeps going.

use super::http_client::HttpClient;
use std::path::{Path, PathBuf};

/// Result of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was written to the target path.
    Saved { bytes: usize },
    /// The server answered with a non-success status.
    BadStatus(u16),
    /// Transport or filesystem fault.
    Failed(String),
}

impl FetchOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// GET `url` and write the body to `target`.
///
/// The body is written to `<target>.part` and renamed into place, so an
/// interrupted write never leaves a file that looks complete to a later run.
pub async fn fetch_image(http: &HttpClient, url: &str, target: &Path) -> FetchOutcome {
    let resp = match http.get_bytes(url).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!("error downloading {url}: {e:#}");
            return FetchOutcome::Failed(format!("{e:#}"));
        }
    };

    if !resp.is_success() {
        tracing::warn!("download failed with status {} for {url}", resp.status);
        return FetchOutcome::BadStatus(resp.status);
    }

    let partial = part_path(target);
    match write_through(&partial, target, &resp.body).await {
        Ok(()) => {
            tracing::info!(
                "downloaded {}",
                target.file_name().unwrap_or_default().to_string_lossy()
            );
            FetchOutcome::Saved {
                bytes: resp.body.len(),
            }
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            tracing::warn!("could not write {}: {e}", target.display());
            FetchOutcome::Failed(e.to_string())
        }
    }
}

async fn write_through(partial: &Path, target: &Path, body: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(partial, body).await?;
    tokio::fs::rename(partial, target).await
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}
