//! collect CLI command.
//!
//! Runs the selected source adapters through the freshness cache: a recent
//! enough CSV in the data directory is reused, otherwise the adapter is
//! called and its output saved as `{prefix}_{stamp}.csv`.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use sentiment_core::{AppConfig, PolarityScorer};
use sentiment_data::{FreshnessCache, PriceTick, TimestampedEvent, TrendPoint};
use sentiment_signals::{
    AnnouncementCollector, LexiconScorer, NewsCollector, PriceCollector, RedditCollector, TrendsCollector,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Data source types for collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// New posts from the configured subreddits
    Reddit,
    /// NewsAPI articles
    News,
    /// Google Trends interest
    Trends,
    /// Binance klines
    Prices,
    /// Categorized announcement search
    Announcements,
}

impl Source {
    /// Returns all available sources.
    pub fn all() -> Vec<Source> {
        vec![
            Source::Reddit,
            Source::News,
            Source::Trends,
            Source::Prices,
            Source::Announcements,
        ]
    }

    /// Returns the source name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Reddit => "reddit",
            Source::News => "news",
            Source::Trends => "trends",
            Source::Prices => "prices",
            Source::Announcements => "announcements",
        }
    }

    /// File prefix for this source's CSV output.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Source::Reddit => "reddit_data",
            Source::News => "news_data",
            Source::Trends => "trends_data",
            Source::Prices => "price_data",
            Source::Announcements => "trump_announcements",
        }
    }
}

/// Arguments for the collect command.
#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    /// Comma-separated sources (reddit,news,trends,prices,announcements) or "all"
    #[arg(long, default_value = "all")]
    pub sources: String,
}

/// Parses a comma-separated source string into a vector of Sources.
///
/// # Errors
/// Returns an error if any source name is invalid.
pub fn parse_sources(s: &str) -> Result<Vec<Source>> {
    let s = s.trim();

    if s.is_empty() || s.to_lowercase() == "all" {
        return Ok(Source::all());
    }

    let mut sources = Vec::new();
    let mut seen = HashSet::new();

    for part in s.split(',') {
        let source_name = part.trim().to_lowercase();

        if source_name.is_empty() {
            continue;
        }

        let source = match source_name.as_str() {
            "reddit" => Source::Reddit,
            "news" => Source::News,
            "trends" => Source::Trends,
            "prices" => Source::Prices,
            "announcements" => Source::Announcements,
            _ => {
                return Err(anyhow!(
                    "Unknown source: '{}'. Valid sources: reddit, news, trends, prices, announcements",
                    source_name
                ))
            }
        };

        if seen.insert(source) {
            sources.push(source);
        }
    }

    if sources.is_empty() {
        return Err(anyhow!("At least one source must be specified"));
    }

    Ok(sources)
}

/// Builds collectors and caches from one configuration.
pub struct Collection<'a> {
    config: &'a AppConfig,
    scorer: Arc<dyn PolarityScorer>,
    now: DateTime<Utc>,
}

impl<'a> Collection<'a> {
    pub fn new(config: &'a AppConfig, now: DateTime<Utc>) -> Self {
        Self {
            config,
            scorer: Arc::new(LexiconScorer::default()),
            now,
        }
    }

    fn cache(&self, source: Source) -> FreshnessCache {
        FreshnessCache::new(
            &self.config.paths.data_dir,
            source.file_prefix(),
            Duration::hours(i64::from(self.config.collection.freshness_hours)),
        )
    }

    /// Start of the rolling collection window.
    fn lookback_start(&self) -> DateTime<Utc> {
        self.now - Duration::hours(i64::from(self.config.collection.lookback_hours))
    }

    pub async fn posts(&self) -> Result<Vec<TimestampedEvent>> {
        let adapter = RedditCollector::new(
            &self.config.collection,
            &self.config.credentials.user_agent,
            self.scorer.clone(),
        )?;
        self.cache(Source::Reddit)
            .load_or_fetch(&adapter, self.lookback_start(), self.now)
            .await
    }

    pub async fn news(&self) -> Result<Vec<TimestampedEvent>> {
        let adapter = NewsCollector::new(self.config, self.scorer.clone())?;
        self.cache(Source::News)
            .load_or_fetch(&adapter, self.lookback_start(), self.now)
            .await
    }

    pub async fn trends(&self) -> Result<Vec<TrendPoint>> {
        let adapter = TrendsCollector::new(&self.config.collection, &self.config.credentials.user_agent)?;
        self.cache(Source::Trends)
            .load_or_fetch(&adapter, self.lookback_start(), self.now)
            .await
    }

    pub async fn prices(&self) -> Result<Vec<PriceTick>> {
        let adapter = PriceCollector::new(&self.config.collection, &self.config.credentials.user_agent)?;
        self.cache(Source::Prices)
            .load_or_fetch(&adapter, self.lookback_start(), self.now)
            .await
    }

    /// Announcements reach back to the configured start date rather than the lookback window.
    pub async fn announcements(&self) -> Result<Vec<TimestampedEvent>> {
        let adapter = AnnouncementCollector::new(self.config, self.scorer.clone())?;
        self.cache(Source::Announcements)
            .load_or_fetch(&adapter, self.config.collection.start_date, self.now)
            .await
    }

    /// Collects one source, returning the number of records.
    pub async fn collect(&self, source: Source) -> Result<usize> {
        let count = match source {
            Source::Reddit => self.posts().await?.len(),
            Source::News => self.news().await?.len(),
            Source::Trends => self.trends().await?.len(),
            Source::Prices => self.prices().await?.len(),
            Source::Announcements => self.announcements().await?.len(),
        };
        Ok(count)
    }
}

/// Runs the collect command.
///
/// A failing source is reported and the remaining sources still run.
///
/// # Errors
/// Returns error for invalid arguments or when every source fails.
pub async fn run_collect(args: CollectArgs, config: &AppConfig) -> Result<()> {
    let sources = parse_sources(&args.sources)?;
    let collection = Collection::new(config, Utc::now());

    tracing::info!(
        sources = ?sources.iter().map(Source::as_str).collect::<Vec<_>>(),
        data_dir = %config.paths.data_dir,
        "Starting collection"
    );

    let mut failures = 0;
    println!("=== Collection Summary ===");
    for source in &sources {
        match collection.collect(*source).await {
            Ok(count) => println!("{:<14} {} records", source.as_str(), count),
            Err(e) => {
                failures += 1;
                tracing::error!(source = source.as_str(), error = %e, "Collection failed");
                println!("{:<14} failed: {}", source.as_str(), e);
            }
        }
    }

    if failures == sources.len() {
        return Err(anyhow!("All {} sources failed", failures));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_sources() {
        assert_eq!(parse_sources("all").unwrap(), Source::all());
        assert_eq!(parse_sources("").unwrap(), Source::all());
    }

    #[test]
    fn parse_sources_dedupes_and_keeps_order() {
        let sources = parse_sources("prices, Reddit,prices").unwrap();
        assert_eq!(sources, vec![Source::Prices, Source::Reddit]);
    }

    #[test]
    fn parse_sources_rejects_unknown() {
        let err = parse_sources("reddit,twitter").unwrap_err();
        assert!(err.to_string().contains("twitter"));
        assert!(parse_sources(",,").is_err());
    }

    #[test]
    fn file_prefixes_are_distinct() {
        let prefixes: HashSet<_> = Source::all().iter().map(Source::file_prefix).collect();
        assert_eq!(prefixes.len(), Source::all().len());
    }

    #[tokio::test]
    async fn news_without_key_fails_fast() {
        let config = AppConfig::default();
        let collection = Collection::new(&config, Utc::now());
        let err = collection.collect(Source::News).await.unwrap_err();
        assert!(err.to_string().contains("NewsAPI key"));
    }
}
