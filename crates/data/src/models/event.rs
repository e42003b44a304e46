//! Timestamped event data model.
//!
//! Captures a social post, news article, or announcement together with the
//! categorical tags and sentiment used to group its price impact.

use chrono::{DateTime, Utc};
use sentiment_core::{SentimentScore, Timestamped};
use serde::{Deserialize, Serialize};

/// Engagement counters reported by the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    /// Net vote score; Reddit scores can be negative
    pub score: i64,
    pub comments: u64,
    pub replies: u64,
    pub reblogs: u64,
    pub favorites: u64,
}

/// A normalized event (post, article, announcement).
///
/// Immutable once collected; builders are only used by adapters and loaders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedEvent {
    /// Provider identifier, used for deduplication when present
    pub id: Option<String>,
    /// When the event was published
    pub timestamp: DateTime<Utc>,
    /// Headline or the first line of the post
    pub title: String,
    /// Body text, description, or selftext
    pub body: Option<String>,
    pub url: Option<String>,
    /// Source name (subreddit, news outlet, feed)
    pub source: String,
    /// Content-type tag (crypto, trade, policy, ...)
    pub content_type: String,
    /// First-person statement rather than third-party reporting
    pub is_direct: bool,
    pub is_crypto: bool,
    /// Categorization confidence in [0, 1]
    pub confidence_score: Option<f64>,
    pub sentiment: Option<SentimentScore>,
    pub engagement: Engagement,
}

impl TimestampedEvent {
    /// Content type used when nothing else is known.
    pub const DEFAULT_CONTENT_TYPE: &'static str = "other";

    /// Creates a new event with no tags.
    pub fn new(timestamp: DateTime<Utc>, source: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            timestamp,
            title: title.into(),
            body: None,
            url: None,
            source: source.into(),
            content_type: Self::DEFAULT_CONTENT_TYPE.to_string(),
            is_direct: false,
            is_crypto: false,
            confidence_score: None,
            sentiment: None,
            engagement: Engagement::default(),
        }
    }

    /// Builder method to add a provider id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method to add body text; empty bodies are ignored.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        if !body.trim().is_empty() {
            self.body = Some(body);
        }
        self
    }

    /// Builder method to add URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder method to set the content type tag.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Builder method to set categorization results.
    #[must_use]
    pub fn with_categorization(mut self, is_direct: bool, is_crypto: bool, confidence: f64) -> Self {
        self.is_direct = is_direct;
        self.is_crypto = is_crypto;
        self.confidence_score = Some(confidence);
        self
    }

    /// Builder method to add sentiment analysis.
    #[must_use]
    pub fn with_sentiment(mut self, sentiment: SentimentScore) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// Builder method to add engagement counters.
    #[must_use]
    pub fn with_engagement(mut self, engagement: Engagement) -> Self {
        self.engagement = engagement;
        self
    }

    /// Sentiment polarity, if scored.
    #[must_use]
    pub fn polarity(&self) -> Option<f64> {
        self.sentiment.map(|s| s.polarity)
    }

    /// Returns the sentiment bucket for this event.
    #[must_use]
    pub fn sentiment_bucket(&self, neutral_band: f64) -> Option<SentimentBucket> {
        self.polarity()
            .map(|p| SentimentBucket::from_polarity(p, neutral_band))
    }

    /// "direct" or "indirect".
    #[must_use]
    pub fn directness(&self) -> &'static str {
        if self.is_direct {
            "direct"
        } else {
            "indirect"
        }
    }

    /// Title and body joined, for keyword matching and scoring.
    #[must_use]
    pub fn full_text(&self) -> String {
        match &self.body {
            Some(body) => format!("{}\n\n{}", self.title, body),
            None => self.title.clone(),
        }
    }
}

impl Timestamped for TimestampedEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Coarse sentiment classification of a polarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SentimentBucket {
    Negative,
    Neutral,
    Positive,
}

impl SentimentBucket {
    /// Buckets a polarity; magnitudes within `neutral_band` are neutral.
    #[must_use]
    pub fn from_polarity(polarity: f64, neutral_band: f64) -> Self {
        if polarity > neutral_band {
            SentimentBucket::Positive
        } else if polarity < -neutral_band {
            SentimentBucket::Negative
        } else {
            SentimentBucket::Neutral
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentBucket::Positive => "positive",
            SentimentBucket::Negative => "negative",
            SentimentBucket::Neutral => "neutral",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_event_new_defaults() {
        let event = TimestampedEvent::new(sample_timestamp(), "Bitcoin", "BTC breaks 100k");

        assert_eq!(event.source, "Bitcoin");
        assert_eq!(event.content_type, "other");
        assert!(!event.is_direct);
        assert_eq!(event.sentiment, None);
        assert_eq!(event.engagement, Engagement::default());
    }

    #[test]
    fn test_builder_pattern() {
        let event = TimestampedEvent::new(sample_timestamp(), "politics", "Trump says bitcoin is great")
            .with_id("abc123")
            .with_body("Full text")
            .with_url("https://example.com")
            .with_content_type("crypto")
            .with_categorization(true, true, 1.0)
            .with_sentiment(SentimentScore::new(0.8, 0.75))
            .with_engagement(Engagement {
                score: 42,
                comments: 7,
                ..Default::default()
            });

        assert_eq!(event.id.as_deref(), Some("abc123"));
        assert_eq!(event.body.as_deref(), Some("Full text"));
        assert_eq!(event.content_type, "crypto");
        assert!(event.is_direct);
        assert_eq!(event.confidence_score, Some(1.0));
        assert_eq!(event.polarity(), Some(0.8));
        assert_eq!(event.engagement.score, 42);
        assert_eq!(event.directness(), "direct");
    }

    #[test]
    fn test_blank_body_is_ignored() {
        let event = TimestampedEvent::new(sample_timestamp(), "x", "t").with_body("   ");
        assert_eq!(event.body, None);
        assert_eq!(event.full_text(), "t");
    }

    #[test]
    fn test_sentiment_bucket_boundaries() {
        assert_eq!(SentimentBucket::from_polarity(0.3, 0.05), SentimentBucket::Positive);
        assert_eq!(SentimentBucket::from_polarity(-0.3, 0.05), SentimentBucket::Negative);
        assert_eq!(SentimentBucket::from_polarity(0.05, 0.05), SentimentBucket::Neutral);
        assert_eq!(SentimentBucket::from_polarity(0.0, 0.0), SentimentBucket::Neutral);
    }

    #[test]
    fn test_sentiment_bucket_requires_score() {
        let event = TimestampedEvent::new(sample_timestamp(), "x", "t");
        assert_eq!(event.sentiment_bucket(0.05), None);

        let scored = event.with_sentiment(SentimentScore::new(-0.5, 0.5));
        assert_eq!(scored.sentiment_bucket(0.05), Some(SentimentBucket::Negative));
        assert_eq!(SentimentBucket::Negative.as_str(), "negative");
    }
}
