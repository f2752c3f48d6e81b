//! Output mode flags and the terminal progress bar.
//!
//! The global `--json` / `--quiet` flags are exported as environment
//! variables by `main` so every command can check them.

use crate::progress::{self, ProgressEmitter, ProgressEventKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

pub fn is_json() -> bool {
    std::env::var_os("POSTGRAB_JSON").is_some()
}

pub fn is_quiet() -> bool {
    std::env::var_os("POSTGRAB_QUIET").is_some()
}

/// Print a JSON value on stdout.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}

/// A progress bar fed by the pipeline's progress events.
///
/// Drop the returned emitter, then await the handle, to finish the bar.
pub fn progress_bar() -> (ProgressEmitter, Option<JoinHandle<()>>) {
    if is_json() || is_quiet() {
        return (ProgressEmitter::disabled(), None);
    }

    let (tx, mut rx) = progress::channel();
    let handle = tokio::spawn(async move {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));

        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            match event.event {
                ProgressEventKind::FeedLoaded { url } => bar.set_message(format!("loading {url}")),
                ProgressEventKind::LoadMoreClicked { clicks } => {
                    bar.set_message(format!("revealed {clicks} more pages"))
                }
                ProgressEventKind::PostsDiscovered { count } => {
                    bar.set_message(format!("found {count} posts"))
                }
                ProgressEventKind::EntryStarted { ordinal, total, url } => {
                    bar.set_length(total as u64);
                    bar.set_position(ordinal.saturating_sub(1) as u64);
                    bar.set_message(url);
                }
                ProgressEventKind::EntryFinished { ordinal, .. } => {
                    bar.set_position(ordinal as u64)
                }
                ProgressEventKind::ImageFinished { file_name, .. } => bar.set_message(file_name),
                ProgressEventKind::PaginationFinished { .. }
                | ProgressEventKind::Warning { .. } => {}
            }
        }
        bar.finish_and_clear();
    });

    (ProgressEmitter::new(Some(tx)), Some(handle))
}

/// Close the emitter and wait for the bar to clear.
pub async fn finish_progress(emitter: ProgressEmitter, handle: Option<JoinHandle<()>>) {
    drop(emitter);
    if let Some(handle) = handle {
        let _ = handle.await;
    }
}
