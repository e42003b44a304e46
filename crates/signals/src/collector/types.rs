//! Shared types for source adapters.
//!
//! Common HTTP plumbing and fetch statistics used across all collectors.

use anyhow::{anyhow, Context, Result};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Default HTTP timeout for provider requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type DirectRateLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// Statistics for one fetch operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectorStats {
    /// Total API requests made
    pub requests: u64,
    /// Number of failed requests
    pub failed_requests: u64,
    /// Records kept
    pub records: u64,
    /// Records dropped as duplicates
    pub duplicates_skipped: u64,
    /// Records dropped for being older than the requested start
    pub too_old: u64,
}

impl CollectorStats {
    /// Formats a summary line.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Records: {}, Requests: {}, Failed: {}, Duplicates: {}, Too old: {}",
            self.records, self.requests, self.failed_requests, self.duplicates_skipped, self.too_old
        )
    }
}

/// Rate-limited JSON/text client for one provider.
#[derive(Clone)]
pub struct HttpSource {
    http: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<DirectRateLimiter>,
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpSource {
    /// Creates a client limited to `requests_per_minute`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(base_url: &str, requests_per_minute: NonZeroU32, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(requests_per_minute))),
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for the rate limiter and GETs `path`, returning the body text.
    ///
    /// # Errors
    /// Returns error on transport failure or a non-success status.
    pub async fn get_text(&self, path: &str, query: &[(&str, String)], headers: &[(&str, &str)]) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let mut request = self.http.get(&url).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("API error ({}) from {}: {}", status, path, error_text));
        }

        response.text().await.context("Failed to read response body")
    }

    /// GETs `path` and decodes the JSON body.
    ///
    /// # Errors
    /// Returns error on transport failure, non-success status, or bad JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.get_text(path, query, headers).await?;
        serde_json::from_str(&body).with_context(|| format!("Failed to parse response from {path}"))
    }
}
