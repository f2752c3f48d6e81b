//! Download orchestration: manifest in, one folder of images per post out.
//!
//! Posts are processed in manifest order and images in document order.
//! Nothing here aborts the batch: a post that cannot be opened is skipped,
//! an image that cannot be fetched is counted as failed, and re-running the
//! whole pipeline picks up whatever is still missing.
//!
//! A file already present at the target path is the only "done" signal.
//! Two different images with the same file name on one post therefore
//! collide, and only the first one is kept.

mod report;

pub use report::{DownloadReport, EntryReport, EntryState, ImageOutcome};

use crate::acquisition::{fetch_image, HttpClient};
use crate::config::{DownloadConfig, SiteProfile};
use crate::manifest::{CollectionEntry, Manifest};
use crate::naming;
use crate::progress::{ProgressEmitter, ProgressEventKind};
use crate::renderer::PageNavigator;
use crate::session::DownloadSession;
use std::path::Path;
use url::Url;

/// Download every entry of `manifest` and report what happened.
pub async fn download_all(
    session: &mut DownloadSession,
    manifest: &Manifest,
    config: &DownloadConfig,
    progress: &mut ProgressEmitter,
) -> DownloadReport {
    for title in manifest.duplicate_titles() {
        let message = format!("several posts are titled \"{title}\" and will share a folder");
        tracing::warn!("{message}");
        progress.emit(ProgressEventKind::Warning { message });
    }

    let total = manifest.len();
    let mut report = DownloadReport::default();

    for entry in manifest.entries() {
        progress.emit(ProgressEventKind::EntryStarted {
            ordinal: entry.ordinal,
            total,
            url: entry.url.clone(),
        });
        tracing::info!("[{}/{}] processing {}", entry.ordinal, total, entry.url);

        let (nav, http) = session.parts();
        let entry_report = process_entry(nav, http, &entry, config, progress).await;

        progress.emit(ProgressEventKind::EntryFinished {
            ordinal: entry_report.ordinal,
            downloaded: entry_report.downloaded,
            skipped: entry_report.skipped,
            failed: entry_report.failed,
        });
        report.entries.push(entry_report);
    }

    tracing::info!(
        "finished {} posts: {} downloaded, {} skipped, {} failed",
        total,
        report.downloaded(),
        report.skipped(),
        report.failed()
    );
    report
}

async fn process_entry(
    nav: &mut dyn PageNavigator,
    http: &HttpClient,
    entry: &CollectionEntry,
    config: &DownloadConfig,
    progress: &mut ProgressEmitter,
) -> EntryReport {
    let mut report = EntryReport::new(entry);
    let site = &config.site;

    // Pending → FolderReady
    let Some(folder) = entry_folder_name(entry, site, config.indexed) else {
        report.abandon("title has no usable characters and the URL has no post id");
        return report;
    };
    let dir = config.output_dir.join(&folder);
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        report.abandon(format!("cannot create folder {}: {e}", dir.display()));
        return report;
    }
    report.folder = Some(folder);
    report.reached = EntryState::FolderReady;

    // FolderReady → PageLoaded
    let page_url = match Url::parse(&entry.url) {
        Ok(url) => url,
        Err(e) => {
            report.abandon(format!("invalid post URL: {e}"));
            return report;
        }
    };
    if let Err(e) = nav.navigate(page_url.as_str()).await {
        report.abandon(e.to_string());
        return report;
    }
    nav.wait(config.timings.post_settle()).await;
    let images = match nav.query_all(&site.image_selector).await {
        Ok(images) => images,
        Err(e) => {
            report.abandon(e.to_string());
            return report;
        }
    };
    report.reached = EntryState::PageLoaded;

    if images.is_empty() {
        tracing::info!("no images found in {}", entry.url);
    } else {
        tracing::debug!("found {} image elements", images.len());
    }

    for img in images {
        let src = match nav.attribute(img, "src").await {
            Ok(Some(src)) => src,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!("skipping image with unreadable src: {e}");
                continue;
            }
        };
        // Avatars, icons and ads live outside the content CDN.
        if !src.contains(&site.content_marker) {
            continue;
        }
        let Ok(source) = page_url.join(src.trim()) else {
            tracing::debug!("skipping malformed image src {src:?}");
            continue;
        };
        let Some(file_name) = naming::image_file_name(&source) else {
            tracing::debug!("skipping image without a file name: {source}");
            continue;
        };

        let target = dir.join(&file_name);
        let outcome = fetch_or_skip(http, &source, &target, config).await;
        report.record(outcome);
        progress.emit(ProgressEventKind::ImageFinished {
            ordinal: entry.ordinal,
            file_name,
            outcome,
        });
    }

    report.reached = EntryState::Done;
    report
}

async fn fetch_or_skip(
    http: &HttpClient,
    source: &Url,
    target: &Path,
    config: &DownloadConfig,
) -> ImageOutcome {
    if tokio::fs::try_exists(target).await.unwrap_or(false) {
        tracing::info!(
            "skipping existing image: {}",
            target.file_name().unwrap_or_default().to_string_lossy()
        );
        return ImageOutcome::Skipped;
    }

    let fetched = fetch_image(http, source.as_str(), target).await;
    tokio::time::sleep(config.timings.download_pause()).await;

    if fetched.is_saved() {
        ImageOutcome::Downloaded
    } else {
        ImageOutcome::Failed
    }
}

/// Folder for an entry, falling back to the post id when the title is unusable.
pub fn entry_folder_name(entry: &CollectionEntry, site: &SiteProfile, indexed: bool) -> Option<String> {
    naming::folder_name(&entry.title, entry.ordinal, indexed).or_else(|| {
        let id = naming::post_id(&entry.url, &site.post_id_pattern)?;
        naming::folder_name(&id, entry.ordinal, indexed)
    })
}
