use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anything carrying a UTC instant.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

/// A provider that produces timestamped records (posts, articles, prices, trends).
///
/// Each adapter owns its own network, rate-limit, and retry concerns; callers
/// only see the materialized records.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Record: Timestamped + Send;

    /// Short provider name used in logs and cache file prefixes.
    fn name(&self) -> &str;

    /// Fetches records observed at or after `since`.
    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Self::Record>>;
}

/// Text polarity scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentScore {
    /// [-1, 1]
    pub polarity: f64,
    /// [0, 1]
    pub subjectivity: f64,
}

impl SentimentScore {
    /// Creates a score, clamping both components into range.
    pub fn new(polarity: f64, subjectivity: f64) -> Self {
        Self {
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: subjectivity.clamp(0.0, 1.0),
        }
    }
}

/// External text-polarity scorer.
pub trait PolarityScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentScore;
}
