//! Async HTTP client wrapping reqwest.
//!
//! Not a browser, just HTTP requests. One client is built per run and
//! reused for every image. Requests are never retried here.

use anyhow::{Context, Result};
use std::time::Duration;

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client shared by every fetch in a run.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client with a standard Chrome user-agent.
    pub fn new(timeout_ms: u64) -> Result<Self> {
        let ua = "Mozilla/5.0 (Linux; Android 13; Pixel 7) \
                  AppleWebKit/537.36 (KHTML, like Gecko) \
                  Chrome/131.0.0.0 Mobile Safari/537.36";

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(ua)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Perform a single GET and read the whole body.
    ///
    /// Any status is returned as-is; only transport faults are errors.
    pub async fn get_bytes(&self, url: &str) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("reading body of {url} failed"))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}
