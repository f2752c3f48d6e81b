//! Per-entry and per-run download accounting.

use crate::manifest::CollectionEntry;
use serde::{Deserialize, Serialize};

/// What happened to one qualifying image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOutcome {
    /// A file with the same name was already in the post folder.
    Skipped,
    Downloaded,
    Failed,
}

/// Furthest step an entry reached.
///
/// `Pending → FolderReady → PageLoaded → Done`; an entry that fails stops at
/// the step before the failure and carries an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    FolderReady,
    PageLoaded,
    Done,
}

/// Result of processing one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReport {
    pub ordinal: usize,
    pub url: String,
    pub folder: Option<String>,
    pub reached: EntryState,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub error: Option<String>,
}

impl EntryReport {
    pub fn new(entry: &CollectionEntry) -> Self {
        Self {
            ordinal: entry.ordinal,
            url: entry.url.clone(),
            folder: None,
            reached: EntryState::Pending,
            downloaded: 0,
            skipped: 0,
            failed: 0,
            error: None,
        }
    }

    pub fn record(&mut self, outcome: ImageOutcome) {
        match outcome {
            ImageOutcome::Skipped => self.skipped += 1,
            ImageOutcome::Downloaded => self.downloaded += 1,
            ImageOutcome::Failed => self.failed += 1,
        }
    }

    /// Mark the entry as abandoned at its current step.
    pub fn abandon(&mut self, error: impl Into<String>) {
        let error = error.into();
        tracing::warn!("skipping post {} ({}): {error}", self.ordinal, self.url);
        self.error = Some(error);
    }

    /// Total qualifying images handled.
    pub fn images(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

/// Result of a whole download run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReport {
    pub entries: Vec<EntryReport>,
}

impl DownloadReport {
    pub fn downloaded(&self) -> usize {
        self.entries.iter().map(|e| e.downloaded).sum()
    }

    pub fn skipped(&self) -> usize {
        self.entries.iter().map(|e| e.skipped).sum()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().map(|e| e.failed).sum()
    }

    /// Entries given up on before `Done`.
    pub fn abandoned(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| e.error.is_some())
    }
}
