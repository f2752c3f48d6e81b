//! The manifest: post URLs and titles persisted as two parallel files.
//!
//! Line `i` of the URL file and line `i` of the title file describe the same
//! post. Pairs are kept together from scrape time on and sorted by URL, so
//! the two files never depend on independent sorts lining up.

use crate::config::ManifestPaths;
use crate::error::ManifestError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One post from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub url: String,
    pub title: String,
    /// 1-based position in the manifest.
    pub ordinal: usize,
}

/// Ordered, equal-length lists of post URLs and titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    urls: Vec<String>,
    titles: Vec<String>,
}

impl Manifest {
    /// Build from parallel lists, rejecting lists of different length.
    pub fn new(urls: Vec<String>, titles: Vec<String>) -> Result<Self, ManifestError> {
        if urls.len() != titles.len() {
            return Err(ManifestError::CardinalityMismatch {
                urls: urls.len(),
                titles: titles.len(),
            });
        }
        Ok(Self { urls, titles })
    }

    /// Build from scraped `(url, title)` pairs.
    ///
    /// Duplicate URLs collapse with the first title winning; the result is
    /// sorted by URL.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut unique: BTreeMap<String, String> = BTreeMap::new();
        for (url, title) in pairs {
            unique.entry(url).or_insert(title);
        }
        let (urls, titles) = unique.into_iter().unzip();
        Self { urls, titles }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Entries in manifest order with 1-based ordinals.
    pub fn entries(&self) -> impl Iterator<Item = CollectionEntry> + '_ {
        self.urls
            .iter()
            .zip(&self.titles)
            .enumerate()
            .map(|(i, (url, title))| CollectionEntry {
                url: url.clone(),
                title: title.clone(),
                ordinal: i + 1,
            })
    }

    /// Titles shared by more than one post; those posts would share a folder.
    pub fn duplicate_titles(&self) -> Vec<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for title in &self.titles {
            *counts.entry(title.as_str()).or_default() += 1;
        }
        let mut dupes: Vec<&str> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(t, _)| t)
            .collect();
        dupes.sort_unstable();
        dupes
    }

    /// Read both files. Blank lines are ignored.
    pub fn load(paths: &ManifestPaths) -> Result<Self, ManifestError> {
        let urls = read_lines(&paths.urls)?;
        let titles = read_lines(&paths.titles)?;
        Self::new(urls, titles)
    }

    /// Write both files.
    ///
    /// Each file is staged next to its target and only renamed into place once
    /// both have been written, so a failed write leaves both targets as they
    /// were. If the second rename fails the URL file is already updated; the
    /// error is returned and no staged file is left behind.
    pub fn write(&self, paths: &ManifestPaths) -> Result<(), ManifestError> {
        if self.urls.len() != self.titles.len() {
            return Err(ManifestError::CardinalityMismatch {
                urls: self.urls.len(),
                titles: self.titles.len(),
            });
        }

        let staged_urls = stage(&paths.urls, &self.urls)?;
        let staged_titles = match stage(&paths.titles, &self.titles) {
            Ok(p) => p,
            Err(e) => {
                let _ = std::fs::remove_file(&staged_urls);
                return Err(e);
            }
        };

        if let Err(e) = commit(&staged_urls, &paths.urls) {
            let _ = std::fs::remove_file(&staged_urls);
            let _ = std::fs::remove_file(&staged_titles);
            return Err(e);
        }
        if let Err(e) = commit(&staged_titles, &paths.titles) {
            let _ = std::fs::remove_file(&staged_titles);
            return Err(e);
        }
        Ok(())
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>, ManifestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ManifestError::Missing(path.to_path_buf())
        } else {
            ManifestError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

fn stage(target: &Path, lines: &[String]) -> Result<PathBuf, ManifestError> {
    let staged = staging_path(target);
    let mut body = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    std::fs::write(&staged, body).map_err(|source| ManifestError::Io {
        path: staged.clone(),
        source,
    })?;
    Ok(staged)
}

fn commit(staged: &Path, target: &Path) -> Result<(), ManifestError> {
    std::fs::rename(staged, target).map_err(|source| ManifestError::Io {
        path: target.to_path_buf(),
        source,
    })
}
