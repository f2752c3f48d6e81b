//! Chromium-based renderer using chromiumoxide.

use super::{ElementId, PageNavigator, Renderer};
use crate::error::{BrowseError, BrowseResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// How often element waits re-query the DOM.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Hard cap on a single page load.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. POSTGRAB_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("POSTGRAB_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.postgrab/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".postgrab/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".postgrab/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".postgrab/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".postgrab/chromium/chrome-linux64/chrome"),
                home.join(".postgrab/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer owning one headless browser process.
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance.
    pub async fn launch() -> Result<Self> {
        let chrome_path = find_chromium().context(
            "Chromium not found. Install Chrome/Chromium or set POSTGRAB_CHROMIUM_PATH.",
        )?;
        tracing::debug!("launching Chromium from {}", chrome_path.display());

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // The CDP handler must be polled for the browser to make progress.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser, handler })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_navigator(&self) -> Result<Box<dyn PageNavigator>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Box::new(ChromiumNavigator {
            page,
            elements: Vec::new(),
        }))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("failed to close Chromium")?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

/// A single Chromium tab.
pub struct ChromiumNavigator {
    page: Page,
    /// Elements handed out since the last navigation, indexed by `ElementId`.
    elements: Vec<Element>,
}

impl ChromiumNavigator {
    fn element(&self, id: ElementId) -> BrowseResult<&Element> {
        self.elements.get(id.0).ok_or(BrowseError::StaleElement(id.0))
    }

    fn register(&mut self, found: Vec<Element>) -> Vec<ElementId> {
        let start = self.elements.len();
        self.elements.extend(found);
        (start..self.elements.len()).map(ElementId).collect()
    }

    /// Poll until `selector` matches, returning the first match.
    ///
    /// With `actionable`, a match only counts once it is rendered with a
    /// clickable box and not disabled; a hidden control times out like an
    /// absent one.
    async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
        actionable: bool,
    ) -> BrowseResult<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            // A failed lookup just means "not there yet".
            if let Ok(element) = self.page.find_element(selector).await {
                if !actionable || is_actionable(&element).await {
                    return Ok(element);
                }
            }
            if Instant::now() >= deadline {
                return Err(BrowseError::Timeout {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

async fn is_actionable(element: &Element) -> bool {
    if element.clickable_point().await.is_err() {
        return false;
    }
    matches!(element.attribute("disabled").await, Ok(None))
}

#[async_trait]
impl PageNavigator for ChromiumNavigator {
    async fn navigate(&mut self, url: &str) -> BrowseResult<()> {
        self.elements.clear();

        let nav_err = |reason: String| BrowseError::Navigation {
            url: url.to_string(),
            reason,
        };

        match tokio::time::timeout(NAVIGATION_TIMEOUT, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => Err(nav_err(e.to_string())),
            Err(_) => Err(nav_err(format!(
                "timed out after {}ms",
                NAVIGATION_TIMEOUT.as_millis()
            ))),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowseResult<()> {
        self.wait_for_element(selector, timeout, false)
            .await
            .map(|_| ())
    }

    async fn click(&mut self, selector: &str, timeout: Duration) -> BrowseResult<()> {
        let element = self.wait_for_element(selector, timeout, true).await?;
        element
            .click()
            .await
            .map_err(|e| BrowseError::Interaction {
                selector: selector.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn query_all(&mut self, selector: &str) -> BrowseResult<Vec<ElementId>> {
        let found = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| BrowseError::Browser(format!("query `{selector}` failed: {e}")))?;
        Ok(self.register(found))
    }

    async fn query_within(
        &mut self,
        parent: ElementId,
        selector: &str,
    ) -> BrowseResult<Vec<ElementId>> {
        // No match inside the parent is reported as an error by CDP.
        let found = self
            .element(parent)?
            .find_elements(selector)
            .await
            .unwrap_or_default();
        Ok(self.register(found))
    }

    async fn attribute(&self, element: ElementId, name: &str) -> BrowseResult<Option<String>> {
        self.element(element)?
            .attribute(name)
            .await
            .map_err(|e| BrowseError::Browser(format!("reading `{name}` failed: {e}")))
    }

    async fn text(&self, element: ElementId) -> BrowseResult<Option<String>> {
        self.element(element)?
            .inner_text()
            .await
            .map_err(|e| BrowseError::Browser(format!("reading text failed: {e}")))
    }

    async fn close(self: Box<Self>) -> BrowseResult<()> {
        self.page
            .close()
            .await
            .map_err(|e| BrowseError::Browser(format!("closing page failed: {e}")))
    }
}
