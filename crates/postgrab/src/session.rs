//! The per-run session: one browser tab and one HTTP client.
//!
//! A session is acquired once, threaded through every pipeline call and
//! released with [`DownloadSession::release`] whatever the pipeline returned,
//! so no browser process outlives a run.

use crate::acquisition::HttpClient;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{NoopRenderer, PageNavigator, Renderer};
use anyhow::Result;

/// One navigation context and one HTTP client, owned for a whole run.
pub struct DownloadSession {
    navigator: Box<dyn PageNavigator>,
    http: HttpClient,
    /// The browser engine, when this session launched it.
    renderer: Option<Box<dyn Renderer>>,
}

impl DownloadSession {
    /// Launch headless Chromium and open one tab.
    ///
    /// Without a usable browser the session fails to open with a pointer to
    /// `postgrab doctor`.
    pub async fn launch(http_timeout_ms: u64) -> Result<Self> {
        let http = HttpClient::new(http_timeout_ms)?;
        let launched = ChromiumRenderer::launch()
            .await
            .map(|r| Box::new(r) as Box<dyn Renderer>);
        Self::open(with_fallback(launched), http).await
    }

    /// Open a tab on `renderer`; the session owns the renderer from now on.
    pub async fn open(mut renderer: Box<dyn Renderer>, http: HttpClient) -> Result<Self> {
        match renderer.new_navigator().await {
            Ok(navigator) => Ok(Self {
                navigator,
                http,
                renderer: Some(renderer),
            }),
            Err(e) => {
                if let Err(shutdown) = renderer.shutdown().await {
                    tracing::warn!("browser shutdown failed: {shutdown:#}");
                }
                Err(e)
            }
        }
    }

    /// A session over an existing navigator whose browser is managed elsewhere.
    pub fn with_navigator(navigator: Box<dyn PageNavigator>, http: HttpClient) -> Self {
        Self {
            navigator,
            http,
            renderer: None,
        }
    }

    pub fn navigator(&mut self) -> &mut dyn PageNavigator {
        self.navigator.as_mut()
    }

    /// Borrow the navigator and the HTTP client at the same time.
    pub fn parts(&mut self) -> (&mut dyn PageNavigator, &HttpClient) {
        (self.navigator.as_mut(), &self.http)
    }

    /// Close the tab and shut the browser down.
    pub async fn close(self) -> Result<()> {
        let closed = self.navigator.close().await;
        if let Some(mut renderer) = self.renderer {
            renderer.shutdown().await?;
        }
        closed?;
        Ok(())
    }

    /// Close the session and hand back `outcome` unchanged.
    ///
    /// Close failures are logged rather than masking the run's own result.
    pub async fn release<T>(self, outcome: T) -> T {
        if let Err(e) = self.close().await {
            tracing::warn!("failed to release browser session: {e:#}");
        }
        outcome
    }
}

/// The launched renderer, or [`NoopRenderer`] when the browser did not start.
fn with_fallback(launched: Result<Box<dyn Renderer>>) -> Box<dyn Renderer> {
    match launched {
        Ok(renderer) => renderer,
        Err(e) => {
            tracing::warn!("failed to initialize Chromium: {e:#}");
            Box::new(NoopRenderer)
        }
    }
}
