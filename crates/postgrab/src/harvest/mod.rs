//! Feed harvesting: exhaust pagination, then scrape post links and titles.
//!
//! Each accepted link yields a `(url, title)` pair captured together, so the
//! manifest never has to re-correlate URLs and titles after the fact.

pub mod pagination;

use crate::config::{HarvestConfig, SiteProfile};
use crate::error::HarvestError;
use crate::naming;
use crate::progress::{ProgressEmitter, ProgressEventKind};
use crate::renderer::{ElementId, PageNavigator};
use std::collections::HashSet;
use url::{Position, Url};

pub use pagination::{LoadMoreState, PaginationEnd, PaginationSummary};

/// Everything discovered on one feed.
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    /// Unique `(url, title)` pairs in discovery order.
    pub pairs: Vec<(String, String)>,
    /// Link elements inspected, accepted or not.
    pub links_seen: usize,
    pub pagination: PaginationSummary,
}

/// Load the feed, exhaust its pagination and collect every post.
///
/// Failing to load the feed or to find the first post link is fatal. Finding
/// no acceptable post links after that is not; the outcome is simply empty.
pub async fn harvest(
    nav: &mut dyn PageNavigator,
    config: &HarvestConfig,
    progress: &mut ProgressEmitter,
) -> Result<HarvestOutcome, HarvestError> {
    let base = parse_url(&config.site.base_url)?;
    let feed = parse_url(&config.feed_url)?;

    tracing::info!("loading feed {feed}");
    nav.navigate(feed.as_str())
        .await
        .map_err(HarvestError::FeedUnavailable)?;
    nav.wait_for_selector(&config.site.link_selector, config.timings.initial_wait())
        .await
        .map_err(HarvestError::MissingPostMarker)?;
    progress.emit(ProgressEventKind::FeedLoaded {
        url: feed.to_string(),
    });

    let pagination = pagination::exhaust(nav, config, progress).await;
    let (pairs, links_seen) = scrape(nav, &config.site, &base).await?;

    tracing::info!(
        "found {} post links ({} link elements inspected)",
        pairs.len(),
        links_seen
    );
    progress.emit(ProgressEventKind::PostsDiscovered { count: pairs.len() });

    Ok(HarvestOutcome {
        pairs,
        links_seen,
        pagination,
    })
}

fn parse_url(raw: &str) -> Result<Url, HarvestError> {
    Url::parse(raw).map_err(|source| HarvestError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

async fn scrape(
    nav: &mut dyn PageNavigator,
    site: &SiteProfile,
    base: &Url,
) -> Result<(Vec<(String, String)>, usize), HarvestError> {
    let links = nav
        .query_all(&site.link_selector)
        .await
        .map_err(HarvestError::Scrape)?;

    let mut seen = HashSet::new();
    let mut pairs = Vec::new();

    for &link in &links {
        let href = match nav.attribute(link, "href").await {
            Ok(Some(href)) => href,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!("skipping link without readable href: {e}");
                continue;
            }
        };
        let Some(url) = post_url(base, &site.post_path_prefix, &href) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let title = match scrape_title(nav, link, &site.title_selector).await {
            Some(title) => title,
            None => match naming::post_id(&url, &site.post_id_pattern) {
                Some(id) => {
                    tracing::debug!("no title for {url}, using post id {id}");
                    id
                }
                None => {
                    tracing::warn!("skipping {url}: no title and no post id");
                    continue;
                }
            },
        };

        tracing::info!("{url}");
        pairs.push((url, title));
    }

    Ok((pairs, links.len()))
}

/// Title from the title element inside the link, else the link's own text.
async fn scrape_title(
    nav: &mut dyn PageNavigator,
    link: ElementId,
    title_selector: &str,
) -> Option<String> {
    if let Ok(inner) = nav.query_within(link, title_selector).await {
        if let Some(&first) = inner.first() {
            if let Some(title) = nav.text(first).await.ok().flatten().and_then(|t| clean_title(&t)) {
                return Some(title);
            }
        }
    }
    nav.text(link)
        .await
        .ok()
        .flatten()
        .and_then(|t| clean_title(&t))
}

/// Sanitize for use as a folder name and collapse whitespace runs.
pub fn clean_title(raw: &str) -> Option<String> {
    let sanitized = naming::sanitize_component(raw)?;
    Some(sanitized.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Absolute post URL for `href`, or `None` when it is not a post link.
///
/// Accepts hrefs starting with `prefix` (resolved against `base`) and
/// absolute URLs on the same host whose path starts with `prefix`.
pub fn post_url(base: &Url, prefix: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with(prefix) {
        return base.join(href).ok().map(String::from);
    }
    let absolute = Url::parse(href).ok()?;
    if absolute.host_str() != base.host_str() {
        return None;
    }
    absolute[Position::BeforePath..]
        .starts_with(prefix)
        .then(|| absolute.to_string())
}
