//! NewsAPI collector.
//!
//! Queries the `everything` endpoint for bitcoin coverage and scores each
//! headline.

use crate::collector::types::{CollectorStats, HttpSource};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nonzero_ext::nonzero;
use sentiment_core::{AppConfig, PolarityScorer, SourceAdapter};
use sentiment_data::{parse_timestamp, TimestampedEvent};
use serde::Deserialize;
use std::sync::Arc;

/// NewsAPI base URL.
pub const NEWSAPI_URL: &str = "https://newsapi.org";

/// NewsAPI's maximum page size.
const MAX_PAGE_SIZE: usize = 100;

/// Placeholder title NewsAPI uses for withdrawn articles.
const REMOVED_MARKER: &str = "[Removed]";

// ========== NewsAPI Response Types ==========

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    pub source: NewsApiSource,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Collects news articles matching a query.
pub struct NewsCollector {
    http: HttpSource,
    api_key: String,
    query: String,
    max_articles: usize,
    scorer: Arc<dyn PolarityScorer>,
}

impl NewsCollector {
    /// Creates a collector; requires `credentials.newsapi_key`.
    ///
    /// # Errors
    /// Returns error if no API key is configured or the client cannot be built.
    pub fn new(config: &AppConfig, scorer: Arc<dyn PolarityScorer>) -> Result<Self> {
        let api_key = config
            .credentials
            .newsapi_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("NewsAPI key not configured (credentials.newsapi_key)"))?;

        Ok(Self {
            http: HttpSource::new(NEWSAPI_URL, nonzero!(30u32), &config.credentials.user_agent)?,
            api_key,
            query: config.collection.news_query.clone(),
            max_articles: config.collection.max_articles,
            scorer,
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(url);
        self
    }

    /// Fetches articles published between `since` and `until`.
    ///
    /// # Errors
    /// Returns error on transport failure or when the API reports an error status.
    pub async fn collect(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<(Vec<TimestampedEvent>, CollectorStats)> {
        let mut stats = CollectorStats {
            requests: 1,
            ..Default::default()
        };

        let query = [
            ("q", self.query.clone()),
            ("from", since.format("%Y-%m-%d").to_string()),
            ("to", until.format("%Y-%m-%d").to_string()),
            ("language", "en".to_string()),
            ("sortBy", "relevancy".to_string()),
            ("pageSize", self.max_articles.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        let response: NewsApiResponse = self
            .http
            .get_json("/v2/everything", &query, &[("X-Api-Key", self.api_key.as_str())])
            .await
            .context("NewsAPI request failed")?;

        if response.status == "error" {
            return Err(anyhow!(
                "NewsAPI error ({}): {}",
                response.code.as_deref().unwrap_or("unknown"),
                response.message.as_deref().unwrap_or("Unknown error")
            ));
        }

        tracing::info!(
            total_results = response.total_results,
            returned = response.articles.len(),
            "NewsAPI response"
        );

        let mut events = Vec::new();
        for article in response.articles {
            match self.convert(article) {
                Some(event) if event.timestamp >= since => events.push(event),
                Some(_) => stats.too_old += 1,
                None => {}
            }
        }

        stats.records = events.len() as u64;
        Ok((events, stats))
    }

    /// Converts an article, dropping removed or undated entries.
    fn convert(&self, article: NewsApiArticle) -> Option<TimestampedEvent> {
        let title = article.title.filter(|t| !t.trim().is_empty() && t != REMOVED_MARKER)?;
        let published = match parse_timestamp(&article.published_at) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, title = %title, "Skipping article with bad timestamp");
                return None;
            }
        };

        let sentiment = self.scorer.score(&title);
        let source = article.source.name.unwrap_or_else(|| "newsapi".to_string());
        let mut event = TimestampedEvent::new(published, source, title).with_sentiment(sentiment);
        if let Some(description) = article.description {
            event = event.with_body(description);
        }
        if let Some(url) = article.url {
            event = event.with_url(url);
        }
        Some(event)
    }
}

#[async_trait]
impl SourceAdapter for NewsCollector {
    type Record = TimestampedEvent;

    fn name(&self) -> &str {
        "news"
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<TimestampedEvent>> {
        let (events, stats) = self.collect(since, Utc::now()).await?;
        tracing::info!("News collection: {}", stats.summary());
        Ok(events)
    }
}
