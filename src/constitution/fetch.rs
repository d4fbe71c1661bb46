//! Download the source policy document, caching it locally.

use crate::models::{PreceptError, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch the document text, reusing the local cache when present.
///
/// Failures here happen before any pipeline work and are fatal.
pub async fn fetch_constitution(url: &str, cache_path: &Path) -> Result<String> {
    if cache_path.exists() {
        debug!(path = %cache_path.display(), "Using cached constitution");
        return std::fs::read_to_string(cache_path)
            .map_err(|e| PreceptError::io("reading cached constitution", e));
    }

    info!(url = url, "Downloading constitution");
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(PreceptError::Network)?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            PreceptError::Timeout(FETCH_TIMEOUT)
        } else {
            PreceptError::Network(e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PreceptError::Api {
            status: status.as_u16(),
            message: format!("fetching constitution from {url}"),
        });
    }

    let text = response
        .text()
        .await
        .map_err(PreceptError::Network)?;

    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| PreceptError::io("creating constitution cache directory", e))?;
    }
    std::fs::write(cache_path, &text)
        .map_err(|e| PreceptError::io("writing constitution cache", e))?;
    info!(path = %cache_path.display(), "Saved constitution to cache");

    Ok(text)
}
