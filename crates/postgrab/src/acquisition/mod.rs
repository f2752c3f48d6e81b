//! HTTP acquisition: the shared client and the single-image fetcher.

pub mod fetcher;
pub mod http_client;

pub use fetcher::{fetch_image, FetchOutcome};
pub use http_client::{HttpClient, HttpResponse};
