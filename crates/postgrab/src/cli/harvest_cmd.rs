//! `postgrab harvest`: collect every post of a feed into the manifest files.

use crate::cli::output::{self, is_json, is_quiet};
use crate::cli::prompt;
use crate::config::{HarvestConfig, ManifestPaths, ProfileFile};
use crate::harvest::{HarvestOutcome, PaginationEnd};
use crate::manifest::Manifest;
use crate::pipeline;
use crate::session::DownloadSession;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(
    feed_url: Option<String>,
    paths: &ManifestPaths,
    profile: Option<&Path>,
    max_clicks: Option<u32>,
    retries: u32,
) -> Result<()> {
    let feed_url = prompt::resolve_feed_url(feed_url)?;
    let config = harvest_config(feed_url, ProfileFile::load(profile)?, max_clicks, retries);

    let mut session = DownloadSession::launch(config.timings.http_timeout_ms)
        .await
        .context("failed to start the browser (run `postgrab doctor`)")?;

    let (mut progress, bar) = output::progress_bar();
    let result = pipeline::harvest_manifest(&mut session, &config, paths, &mut progress).await;
    output::finish_progress(progress, bar).await;

    let (manifest, outcome) = session.release(result).await?;
    print_summary(&manifest, &outcome, paths);
    Ok(())
}

/// Pipeline configuration from a profile plus the command-line overrides.
pub fn harvest_config(
    feed_url: String,
    profile: ProfileFile,
    max_clicks: Option<u32>,
    retries: u32,
) -> HarvestConfig {
    let mut config = HarvestConfig::new(feed_url, profile);
    config.max_load_more_clicks = max_clicks;
    config.max_transient_retries = retries;
    config
}

/// Harvest results as text or JSON, depending on the output mode.
pub fn print_summary(manifest: &Manifest, outcome: &HarvestOutcome, paths: &ManifestPaths) {
    if is_json() {
        output::print_json(&serde_json::json!({
            "posts": manifest.len(),
            "links_seen": outcome.links_seen,
            "pagination": outcome.pagination,
            "urls_file": paths.urls.display().to_string(),
            "titles_file": paths.titles.display().to_string(),
        }));
        return;
    }
    if is_quiet() {
        return;
    }

    let ending = match outcome.pagination.end {
        PaginationEnd::Exhausted => "feed exhausted",
        PaginationEnd::GaveUp => "gave up after repeated load-more failures",
        PaginationEnd::ClickLimit => "click limit reached",
    };
    println!(
        "Collected {} posts ({} load-more clicks, {ending})",
        manifest.len(),
        outcome.pagination.clicks
    );
    println!("  URLs:   {}", paths.urls.display());
    println!("  Titles: {}", paths.titles.display());
}
