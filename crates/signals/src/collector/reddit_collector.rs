//! Reddit new-posts collector.
//!
//! Reads the public `new.json` listing for each configured subreddit, keeps
//! posts created since the requested start, dedupes by post id, and scores
//! titles with the injected polarity scorer.

use crate::collector::types::{CollectorStats, HttpSource};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nonzero_ext::nonzero;
use sentiment_core::{CollectionConfig, PolarityScorer, SourceAdapter};
use sentiment_data::{Engagement, TimestampedEvent};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Reddit public API base URL.
pub const REDDIT_API_URL: &str = "https://www.reddit.com";

/// Reddit's maximum page size for listings.
pub(crate) const MAX_LISTING_PAGE: usize = 100;

// ========== Reddit API Response Types ==========

/// A listing page.
#[derive(Debug, Deserialize)]
pub struct RedditListing {
    pub data: RedditListingData,
}

#[derive(Debug, Deserialize)]
pub struct RedditListingData {
    #[serde(default)]
    pub children: Vec<RedditChild>,
    /// Cursor for the next page
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RedditChild {
    pub data: RedditPost,
}

/// A single post.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub author: Option<String>,
    pub subreddit: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    pub url: Option<String>,
    /// Seconds since epoch (fractional)
    pub created_utc: f64,
}

impl RedditPost {
    /// Creation time, if representable.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created_utc.floor() as i64, 0).single()
    }

    /// Converts into an event tagged with `subreddit` as its source.
    #[must_use]
    pub fn into_event(self, subreddit: &str, created_at: DateTime<Utc>) -> TimestampedEvent {
        let mut event = TimestampedEvent::new(created_at, subreddit, self.title)
            .with_id(self.id)
            .with_body(self.selftext)
            .with_engagement(Engagement {
                score: self.score,
                comments: self.num_comments,
                ..Default::default()
            });
        if let Some(url) = self.url {
            event = event.with_url(url);
        }
        event
    }
}

/// Fetches listing pages from `path` until `max_posts` posts are seen, a page
/// is empty, or posts are older than `since` (listings sorted newest first).
pub(crate) async fn fetch_listing(
    http: &HttpSource,
    path: &str,
    base_query: &[(&str, String)],
    max_posts: usize,
    since: DateTime<Utc>,
    newest_first: bool,
) -> Result<Vec<RedditPost>> {
    let mut posts = Vec::new();
    let mut after: Option<String> = None;

    while posts.len() < max_posts {
        let page_size = (max_posts - posts.len()).min(MAX_LISTING_PAGE);
        let mut query: Vec<(&str, String)> = base_query.to_vec();
        query.push(("limit", page_size.to_string()));
        query.push(("raw_json", "1".to_string()));
        if let Some(cursor) = &after {
            query.push(("after", cursor.clone()));
        }

        let listing: RedditListing = http.get_json(path, &query, &[]).await?;
        let page: Vec<RedditPost> = listing.data.children.into_iter().map(|c| c.data).collect();
        if page.is_empty() {
            break;
        }

        let reached_old = newest_first
            && page
                .last()
                .and_then(RedditPost::created_at)
                .is_some_and(|t| t < since);
        posts.extend(page);

        after = listing.data.after;
        if after.is_none() || reached_old {
            break;
        }
    }

    posts.truncate(max_posts);
    Ok(posts)
}

/// Collects new posts from a set of subreddits.
pub struct RedditCollector {
    http: HttpSource,
    subreddits: Vec<String>,
    max_posts: usize,
    scorer: Arc<dyn PolarityScorer>,
}

impl RedditCollector {
    /// Creates a collector for the configured subreddits.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &CollectionConfig, user_agent: &str, scorer: Arc<dyn PolarityScorer>) -> Result<Self> {
        Ok(Self {
            http: HttpSource::new(REDDIT_API_URL, nonzero!(60u32), user_agent)?,
            subreddits: config.subreddits.clone(),
            max_posts: config.max_reddit_posts,
            scorer,
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(url);
        self
    }

    /// Fetches and converts posts, returning fetch statistics alongside.
    ///
    /// A failing subreddit is logged and skipped.
    pub async fn collect(&self, since: DateTime<Utc>) -> (Vec<TimestampedEvent>, CollectorStats) {
        let mut stats = CollectorStats::default();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut events = Vec::new();

        for subreddit in &self.subreddits {
            let path = format!("/r/{subreddit}/new.json");
            stats.requests += 1;

            let posts = match fetch_listing(&self.http, &path, &[], self.max_posts, since, true).await {
                Ok(posts) => posts,
                Err(e) => {
                    stats.failed_requests += 1;
                    tracing::error!(subreddit = %subreddit, error = %e, "Failed to fetch subreddit");
                    continue;
                }
            };

            let before = events.len();
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

                let sentiment = self.scorer.score(&post.title);
                events.push(post.into_event(subreddit, created_at).with_sentiment(sentiment));
            }
            tracing::info!(subreddit = %subreddit, posts = events.len() - before, "Collected posts");
        }

        stats.records = events.len() as u64;
        (events, stats)
    }
}

#[async_trait]
impl SourceAdapter for RedditCollector {
    type Record = TimestampedEvent;

    fn name(&self) -> &str {
        "reddit"
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<TimestampedEvent>> {
        let (events, stats) = self.collect(since).await;
        tracing::info!("Reddit collection: {}", stats.summary());
        Ok(events)
    }
}
