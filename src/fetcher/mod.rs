//! Page fetching and field extraction
//!
//! The pipeline only depends on the [`PageFetcher`] contract: turn a target
//! URL into extracted image URLs or a [`FetchError`], safely callable from
//! any number of concurrent workers. The production implementation,
//! [`HttpPageFetcher`], builds a fresh, isolated HTTP client for every call
//! so no connection or cookie state leaks between items, and extracts
//! fields from the fetched HTML with configured CSS selectors.

use crate::config::FetcherConfig;
use async_trait::async_trait;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// Errors produced by a single fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid target URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("Request failed for {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to read body for {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("Container {selector:?} not found on {url}")]
    ContainerNotFound { url: String, selector: String },
}

/// Capability that turns a target URL into extracted data
///
/// Implementations must be safe to invoke concurrently from independent
/// callers without shared mutable state, and must respect an internal
/// timeout rather than blocking indefinitely.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one target and returns the extracted image URLs
    async fn fetch(&self, target: &str) -> Result<Vec<String>, FetchError>;

    /// Releases any held resources; invoked once after the pipeline drains
    async fn cleanup(&self) {}
}

/// Production fetcher backed by reqwest and scraper
///
/// Each call establishes its own client, mirroring a fresh browser session
/// per request: no cookies, connections, or redirects survive between
/// items.
pub struct HttpPageFetcher {
    config: FetcherConfig,
}

impl HttpPageFetcher {
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Builds a single-use HTTP client with the configured timeout
    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .connect_timeout(self.config.request_timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::ClientBuild)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, target: &str) -> Result<Vec<String>, FetchError> {
        Url::parse(target).map_err(|source| FetchError::InvalidUrl {
            url: target.to_string(),
            source,
        })?;

        let client = self.build_client()?;

        let response = client.get(target).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: target.to_string(),
                }
            } else if e.is_connect() {
                FetchError::Connect {
                    url: target.to_string(),
                }
            } else {
                FetchError::Request {
                    url: target.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: target.to_string(),
                }
            } else {
                FetchError::Body {
                    url: target.to_string(),
                    source: e,
                }
            }
        })?;

        extract_images(&body, target, &self.config)
    }

    async fn cleanup(&self) {
        // Nothing pooled to release with a fresh client per request
        tracing::debug!("Fetcher cleanup complete");
    }
}

/// Extracts image URLs from a fetched page body
///
/// The container selector must match at least once (the page is considered
/// not loaded otherwise), then the configured attribute is collected from
/// every element matching the image selector, keeping only https values.
fn extract_images(
    body: &str,
    url: &str,
    config: &FetcherConfig,
) -> Result<Vec<String>, FetchError> {
    let document = Html::parse_document(body);

    // Selectors are validated at config load; a parse failure here means
    // the config was bypassed, so treat it as a missing container
    let container = Selector::parse(&config.container_selector).map_err(|_| {
        FetchError::ContainerNotFound {
            url: url.to_string(),
            selector: config.container_selector.clone(),
        }
    })?;

    if document.select(&container).next().is_none() {
        return Err(FetchError::ContainerNotFound {
            url: url.to_string(),
            selector: config.container_selector.clone(),
        });
    }

    let images = Selector::parse(&config.image_selector).map_err(|_| {
        FetchError::ContainerNotFound {
            url: url.to_string(),
            selector: config.image_selector.clone(),
        }
    })?;

    let extracted = document
        .select(&images)
        .filter_map(|element| element.value().attr(&config.image_attribute))
        .filter(|value| value.starts_with("https://"))
        .map(str::to_string)
        .collect();

    Ok(extracted)
}
