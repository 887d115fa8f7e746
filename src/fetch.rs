use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::info;

const HTTP_TIMEOUT: Duration = Duration::from_secs(45);

/// Plain GET with browser-ish headers. No retries: a failure here means the
/// endpoint or the network is down and the run should stop.
pub fn http_get_text(url: &str, user_agent: &str) -> Result<String> {
    let client = Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(url)
        .header("User-Agent", user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Cache-Control", "no-cache")
        .send()
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("GET {} returned an error status", url))?;

    response
        .text()
        .with_context(|| format!("failed to read response body of {}", url))
}

/// Read `cache_path` if present; otherwise fetch `url` and persist the raw
/// body to the cache before returning it.
pub fn fetch_cached(cache_path: &Path, url: &str, user_agent: &str) -> Result<String> {
    if cache_path.exists() {
        info!("Using cached copy: {}", cache_path.display());
        let bytes = fs::read(cache_path)
            .with_context(|| format!("failed to read cache file {}", cache_path.display()))?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    info!("Fetching {}", url);
    let body = http_get_text(url, user_agent)?;
    if let Some(parent) = cache_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create cache dir {}", parent.display()))?;
    }
    fs::write(cache_path, &body)
        .with_context(|| format!("failed to write cache file {}", cache_path.display()))?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_file_wins_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<html>cached</html>").unwrap();
        // URL is unroutable on purpose; the cache must short-circuit the fetch.
        let body = fetch_cached(&path, "http://invalid.invalid/", "test-agent").unwrap();
        assert_eq!(body, "<html>cached</html>");
    }

    #[test]
    fn cache_read_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, b"ok \xff\xfe bytes").unwrap();
        let body = fetch_cached(&path, "http://invalid.invalid/", "test-agent").unwrap();
        assert!(body.starts_with("ok "));
    }
}
