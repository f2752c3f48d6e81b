//! Harvest-to-manifest over an already-open session.

use crate::config::{HarvestConfig, ManifestPaths};
use crate::harvest::{self, HarvestOutcome};
use crate::manifest::Manifest;
use crate::progress::ProgressEmitter;
use crate::session::DownloadSession;
use anyhow::{Context, Result};

/// Harvest a feed and persist the manifest.
///
/// Nothing is written unless the harvest succeeds and both lists agree.
pub async fn harvest_manifest(
    session: &mut DownloadSession,
    config: &HarvestConfig,
    paths: &ManifestPaths,
    progress: &mut ProgressEmitter,
) -> Result<(Manifest, HarvestOutcome)> {
    let outcome = harvest::harvest(session.navigator(), config, progress).await?;
    let manifest = Manifest::from_pairs(outcome.pairs.iter().cloned());

    if manifest.is_empty() {
        tracing::warn!("no post links found on {}", config.feed_url);
    }
    for title in manifest.duplicate_titles() {
        tracing::warn!("several posts are titled \"{title}\" and will share a folder");
    }

    manifest.write(paths).with_context(|| {
        format!(
            "failed to save manifest to {} and {}",
            paths.urls.display(),
            paths.titles.display()
        )
    })?;
    tracing::info!(
        "saved {} posts to {} and {}",
        manifest.len(),
        paths.urls.display(),
        paths.titles.display()
    );
    Ok((manifest, outcome))
}
