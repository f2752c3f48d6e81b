//! `postgrab download`: fetch the images of every post in the manifest.

use crate::cli::output::{self, is_json, is_quiet};
use crate::cli::prompt;
use crate::config::{DownloadConfig, ManifestPaths, ProfileFile};
use crate::download::{self, DownloadReport};
use crate::manifest::Manifest;
use crate::session::DownloadSession;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(
    indexed: Option<&str>,
    output_dir: &Path,
    paths: &ManifestPaths,
    profile: Option<&Path>,
) -> Result<()> {
    let indexed = prompt::resolve_indexed(indexed)?;
    let config = DownloadConfig::new(ProfileFile::load(profile)?, indexed, output_dir);

    // A broken manifest must stop the run before the browser starts.
    let manifest = Manifest::load(paths).context("cannot read the manifest")?;
    tracing::info!("loaded {} posts from {}", manifest.len(), paths.urls.display());

    let mut session = DownloadSession::launch(config.timings.http_timeout_ms)
        .await
        .context("failed to start the browser (run `postgrab doctor`)")?;

    let (mut progress, bar) = output::progress_bar();
    let report = download::download_all(&mut session, &manifest, &config, &mut progress).await;
    output::finish_progress(progress, bar).await;

    let report = session.release(report).await;
    print_report(&report)
}

/// The download report as text or JSON, depending on the output mode.
pub fn print_report(report: &DownloadReport) -> Result<()> {
    if is_json() {
        output::print_json(&serde_json::to_value(report)?);
        return Ok(());
    }
    if is_quiet() {
        return Ok(());
    }

    println!(
        "Processed {} posts: {} downloaded, {} skipped, {} failed",
        report.entries.len(),
        report.downloaded(),
        report.skipped(),
        report.failed()
    );
    for entry in report.abandoned() {
        println!(
            "  [!!] #{} {}: {}",
            entry.ordinal,
            entry.url,
            entry.error.as_deref().unwrap_or("not finished")
        );
    }
    Ok(())
}
