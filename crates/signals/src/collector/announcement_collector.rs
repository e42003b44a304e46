//! Announcement search collector.
//!
//! Runs each configured query against each configured subreddit's search
//! endpoint, categorizes the hits, and keeps the relevant ones ranked by
//! confidence.

use crate::categorize::{categorize_announcement, rank_announcements};
use crate::collector::reddit_collector::{fetch_listing, REDDIT_API_URL};
use crate::collector::types::{CollectorStats, HttpSource};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nonzero_ext::nonzero;
use sentiment_core::{AppConfig, CategorizationConfig, PolarityScorer, SourceAdapter};
use sentiment_data::TimestampedEvent;
use std::collections::HashSet;
use std::sync::Arc;

/// Searches subreddits for announcements and categorizes them.
pub struct AnnouncementCollector {
    http: HttpSource,
    subreddits: Vec<String>,
    queries: Vec<String>,
    max_results: usize,
    categorization: CategorizationConfig,
    scorer: Arc<dyn PolarityScorer>,
}

impl AnnouncementCollector {
    /// Creates a collector from application configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &AppConfig, scorer: Arc<dyn PolarityScorer>) -> Result<Self> {
        Ok(Self {
            http: HttpSource::new(REDDIT_API_URL, nonzero!(60u32), &config.credentials.user_agent)?,
            subreddits: config.collection.announcement_subreddits.clone(),
            queries: config.collection.announcement_queries.clone(),
            max_results: config.collection.max_announcement_results,
            categorization: config.categorization.clone(),
            scorer,
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(url);
        self
    }

    /// Categorizes one search hit, returning it only when relevant.
    fn process(&self, event: TimestampedEvent) -> Option<TimestampedEvent> {
        let body = event.body.clone().unwrap_or_default();
        let categorization = categorize_announcement(&event.title, &body, &self.categorization);
        if !categorization.is_relevant(&self.categorization) {
            return None;
        }

        let scored_text = if body.trim().is_empty() { &event.title } else { &body };
        let sentiment = self.scorer.score(scored_text);
        Some(categorization.apply(event).with_sentiment(sentiment))
    }

    /// Runs every (subreddit, query) search since `since`.
    ///
    /// Failed searches are logged and skipped.
    pub async fn collect(&self, since: DateTime<Utc>) -> (Vec<TimestampedEvent>, CollectorStats) {
        let mut stats = CollectorStats::default();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut announcements = Vec::new();

        for subreddit in &self.subreddits {
            let path = format!("/r/{subreddit}/search.json");

            for query in &self.queries {
                stats.requests += 1;
                let params = [
                    ("q", query.clone()),
                    ("restrict_sr", "1".to_string()),
                    ("sort", "new".to_string()),
                    ("t", "year".to_string()),
                ];

                let posts = match fetch_listing(&self.http, &path, &params, self.max_results, since, true).await {
                    Ok(posts) => posts,
                    Err(e) => {
                        stats.failed_requests += 1;
                        tracing::error!(subreddit = %subreddit, query = %query, error = %e, "Search failed");
                        continue;
                    }
                };

                for post in posts {
                    let Some(created_at) = post.created_at() else {
                        continue;
                    };
                    if created_at < since {
                        stats.too_old += 1;
                        continue;
                    }
                    if !seen_ids.insert(post.id.clone()) {
                        stats.duplicates_skipped += 1;
                        continue;
                    }
                    if let Some(event) = self.process(post.into_event(subreddit, created_at)) {
                        announcements.push(event);
                    }
                }
            }
        }

        rank_announcements(&mut announcements);
        stats.records = announcements.len() as u64;

        let direct = announcements.iter().filter(|a| a.is_direct).count();
        let crypto = announcements.iter().filter(|a| a.is_crypto).count();
        tracing::info!(
            total = announcements.len(),
            direct,
            crypto,
            %since,
            "Collected announcements"
        );

        (announcements, stats)
    }
}

#[async_trait]
impl SourceAdapter for AnnouncementCollector {
    type Record = TimestampedEvent;

    fn name(&self) -> &str {
        "announcements"
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<TimestampedEvent>> {
        let (events, stats) = self.collect(since).await;
        tracing::info!("Announcement collection: {}", stats.summary());
        Ok(events)
    }
}
