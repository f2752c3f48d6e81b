//! Progress events and broadcast channel for harvest and download runs.
//!
//! The pipelines emit `ProgressEvent`s through a `tokio::sync::broadcast`
//! channel to any subscriber (the CLI progress bar, tests). When no
//! subscriber exists, events are silently dropped.

use crate::download::ImageOutcome;
use crate::harvest::PaginationEnd;
use serde::{Deserialize, Serialize};

/// A progress event emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The feed page loaded and shows post links.
    FeedLoaded { url: String },
    /// One more page of the feed was revealed.
    LoadMoreClicked { clicks: u32 },
    /// The load-more loop ended.
    PaginationFinished { clicks: u32, end: PaginationEnd },
    /// Post links were scraped from the fully loaded feed.
    PostsDiscovered { count: usize },
    /// A manifest entry is being processed.
    EntryStarted {
        ordinal: usize,
        total: usize,
        url: String,
    },
    /// One image on the current entry was handled.
    ImageFinished {
        ordinal: usize,
        file_name: String,
        outcome: ImageOutcome,
    },
    /// A manifest entry is done, successfully or not.
    EntryFinished {
        ordinal: usize,
        downloaded: usize,
        skipped: usize,
        failed: usize,
    },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Numbers and sends events for one run.
#[derive(Debug, Default)]
pub struct ProgressEmitter {
    tx: Option<ProgressSender>,
    seq: u64,
}

impl ProgressEmitter {
    pub fn new(tx: Option<ProgressSender>) -> Self {
        Self { tx, seq: 0 }
    }

    /// An emitter that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Emit an event, ignoring send errors (no receivers listening).
    pub fn emit(&mut self, event: ProgressEventKind) {
        if let Some(ref sender) = self.tx {
            self.seq += 1;
            let _ = sender.send(ProgressEvent {
                seq: self.seq,
                event,
            });
        }
    }
}
