//! `postgrab run`: harvest a feed and download every post in one session.

use crate::cli::download_cmd::print_report;
use crate::cli::harvest_cmd::{harvest_config, print_summary};
use crate::cli::output;
use crate::cli::prompt;
use crate::config::{DownloadConfig, ManifestPaths, ProfileFile};
use crate::download;
use crate::pipeline;
use crate::session::DownloadSession;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(
    feed_url: Option<String>,
    indexed: Option<&str>,
    output_dir: &Path,
    paths: &ManifestPaths,
    profile: Option<&Path>,
    max_clicks: Option<u32>,
    retries: u32,
) -> Result<()> {
    // Ask everything up front so the browser never waits on the terminal.
    let feed_url = prompt::resolve_feed_url(feed_url)?;
    let indexed = prompt::resolve_indexed(indexed)?;
    let profile = ProfileFile::load(profile)?;

    let harvest = harvest_config(feed_url, profile.clone(), max_clicks, retries);
    let download = DownloadConfig::new(profile, indexed, output_dir);

    let mut session = DownloadSession::launch(harvest.timings.http_timeout_ms)
        .await
        .context("failed to start the browser (run `postgrab doctor`)")?;

    let (mut progress, bar) = output::progress_bar();
    let harvested = pipeline::harvest_manifest(&mut session, &harvest, paths, &mut progress).await;
    let (manifest, outcome) = match harvested {
        Ok(harvested) => harvested,
        Err(e) => {
            output::finish_progress(progress, bar).await;
            return session.release(Err(e)).await;
        }
    };
    let report = download::download_all(&mut session, &manifest, &download, &mut progress).await;
    output::finish_progress(progress, bar).await;

    let report = session.release(report).await;
    if !output::is_json() {
        print_summary(&manifest, &outcome, paths);
    }
    print_report(&report)
}
