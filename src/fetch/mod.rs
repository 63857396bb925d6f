//! HTTP plumbing for remote trip sources.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};
use tracing::debug;

/// GETs `url` and returns the response body.
///
/// # Errors
///
/// Fails on transport errors and on any non-success status.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("GET {url} returned {status}");
    }

    let body = resp.bytes().await?;
    debug!(url, bytes = body.len(), "Fetched remote source");
    Ok(body.to_vec())
}
