//! Browser abstraction used by both pipelines.
//!
//! Defines the `Renderer` and `PageNavigator` traits that abstract over the
//! browser engine (currently Chromium via chromiumoxide). The harvest and
//! download code only ever talks to a `PageNavigator`, which keeps them
//! testable against a scripted page.

pub mod chromium;

use crate::error::{BrowseError, BrowseResult};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Opaque handle to an element returned by a query.
///
/// Handles stay valid until the next call to [`PageNavigator::navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

/// A browser engine that can open navigation contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a new navigation context (tab).
    async fn new_navigator(&self) -> Result<Box<dyn PageNavigator>>;
    /// Shut down the browser engine.
    async fn shutdown(&mut self) -> Result<()>;
}

/// A single navigation context: one tab, driven serially.
#[async_trait]
pub trait PageNavigator: Send + Sync {
    /// Load `url` and wait for the load event.
    async fn navigate(&mut self, url: &str) -> BrowseResult<()>;

    /// Wait until at least one element matches `selector`.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowseResult<()>;

    /// Wait for `selector` to appear, then click the first match.
    ///
    /// Returns [`BrowseError::Timeout`] when the element never appears.
    async fn click(&mut self, selector: &str, timeout: Duration) -> BrowseResult<()>;

    /// Let the page settle for a fixed time.
    async fn wait(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// All elements matching `selector`, in document order.
    async fn query_all(&mut self, selector: &str) -> BrowseResult<Vec<ElementId>>;

    /// Descendants of `parent` matching `selector`, in document order.
    async fn query_within(
        &mut self,
        parent: ElementId,
        selector: &str,
    ) -> BrowseResult<Vec<ElementId>>;

    /// Value of attribute `name`, if present.
    async fn attribute(&self, element: ElementId, name: &str) -> BrowseResult<Option<String>>;

    /// Rendered text content of the element.
    async fn text(&self, element: ElementId) -> BrowseResult<Option<String>>;

    /// Close this context.
    async fn close(self: Box<Self>) -> BrowseResult<()>;
}

/// A renderer used when Chromium is unavailable.
///
/// Every attempt to open a navigator fails, so commands that need a browser
/// stop with a clear message instead of a launch error.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_navigator(&self) -> Result<Box<dyn PageNavigator>> {
        Err(BrowseError::Browser(
            "browser not available, run `postgrab doctor` for details".to_string(),
        )
        .into())
    }

    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}
