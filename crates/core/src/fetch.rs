//! HTTP page fetching.
//!
//! Only available with the `fetch` feature. The engine itself never
//! fetches page one (callers hand it a snapshot); this module exists
//! for continuation pages during pagination merging and as a
//! convenience for callers that want the whole fetch-and-extract flow.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::{ExtractError, Result};
use crate::pagination::PageFetcher;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (compatible; Inkpress/0.1; +https://github.com/inkpress/inkpress)"
                .to_string(),
        }
    }
}

/// Fetches HTML over HTTP(S) with browser-like headers.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Fetch a page by URL string, validating it first.
    pub async fn fetch_str(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ExtractError::InvalidUrl(format!(
                "unsupported scheme '{}', expected http or https",
                parsed.scheme()
            )));
        }
        self.fetch(&parsed).await
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", &self.config.user_agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout { timeout: self.config.timeout }
                } else {
                    ExtractError::Http(e)
                }
            })?;

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.contains("Inkpress"));
    }

    #[tokio::test]
    async fn test_fetch_str_rejects_invalid_url() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        assert!(matches!(
            fetcher.fetch_str("not-a-url").await,
            Err(ExtractError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_str_rejects_file_scheme() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        assert!(matches!(
            fetcher.fetch_str("file:///etc/hosts").await,
            Err(ExtractError::InvalidUrl(_))
        ));
    }
}
