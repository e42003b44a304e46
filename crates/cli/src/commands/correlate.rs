//! correlate CLI command.
//!
//! Buckets post sentiment, search interest, and price change onto one grid
//! and prints their correlation matrix.

use super::collect::Source;
use super::resolve_input;
use anyhow::{Context, Result};
use chrono::Duration;
use clap::Args;
use sentiment_core::AppConfig;
use sentiment_data::{CsvStorage, PriceTick, TimestampedEvent, TrendPoint};
use sentiment_signals::validation::HEADLINE_PAIRS;
use sentiment_signals::{market_series, CorrelationEngine, CorrelationMatrix, CorrelationReport};
use std::path::PathBuf;

/// Arguments for the correlate command.
#[derive(Args, Debug, Clone, Default)]
pub struct CorrelateArgs {
    /// Reddit posts CSV (default: newest reddit file in the data directory)
    #[arg(long)]
    pub posts: Option<PathBuf>,

    /// Trends CSV (default: newest trends file in the data directory)
    #[arg(long)]
    pub trends: Option<PathBuf>,

    /// Price CSV (default: newest price file in the data directory)
    #[arg(long)]
    pub prices: Option<PathBuf>,

    /// Bucket width in minutes (default: correlation.bucket_minutes)
    #[arg(long)]
    pub bucket_minutes: Option<u32>,
}

/// Formats the highlighted pairs, e.g. price change against trump interest.
pub fn headline_text(matrix: &CorrelationMatrix) -> String {
    let mut output = String::new();
    for (first, second) in HEADLINE_PAIRS {
        let value = match matrix.get(first, second) {
            Some(coefficient) => match coefficient.value() {
                Some(r) => format!("{r:.3}"),
                None => "undefined".to_string(),
            },
            None => "n/a".to_string(),
        };
        output.push_str(&format!("Correlation between {first} and {second}: {value}\n"));
    }
    output
}

/// Correlates loaded records and renders the report.
///
/// # Errors
/// Returns error for a zero bucket width.
pub fn correlate_records(
    posts: &[TimestampedEvent],
    trends: &[TrendPoint],
    prices: &[PriceTick],
    bucket_minutes: u32,
) -> Result<CorrelationReport> {
    let engine = CorrelationEngine::new(Duration::minutes(i64::from(bucket_minutes)))?;
    let series = market_series(posts, trends, prices);
    let (table, matrix) = engine.correlate(&series)?;
    Ok(CorrelationReport::generate(&table, matrix, i64::from(bucket_minutes)))
}

/// Runs the correlate command.
///
/// # Errors
/// Returns error if an input cannot be found or loaded.
pub fn run_correlate(args: CorrelateArgs, config: &AppConfig) -> Result<()> {
    let data_dir = &config.paths.data_dir;
    let posts_path = resolve_input(args.posts, data_dir, Source::Reddit.file_prefix())?;
    let trends_path = resolve_input(args.trends, data_dir, Source::Trends.file_prefix())?;
    let prices_path = resolve_input(args.prices, data_dir, Source::Prices.file_prefix())?;

    let posts = CsvStorage::read_events(&posts_path, "reddit")
        .with_context(|| format!("Failed to load posts from {}", posts_path.display()))?;
    let trends = CsvStorage::read_trends(&trends_path)
        .with_context(|| format!("Failed to load trends from {}", trends_path.display()))?;
    let prices = CsvStorage::read_prices(&prices_path)
        .with_context(|| format!("Failed to load prices from {}", prices_path.display()))?;

    let bucket_minutes = args.bucket_minutes.unwrap_or(config.correlation.bucket_minutes);
    let report = correlate_records(&posts.events, &trends, prices.ticks(), bucket_minutes)?;

    println!("{}", report.to_text());
    println!("{}", headline_text(&report.matrix));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sentiment_core::SentimentScore;
    use sentiment_data::PriceSeries;
    use tempfile::TempDir;

    #[test]
    fn zero_bucket_is_rejected() {
        assert!(correlate_records(&[], &[], &[], 0).is_err());
    }

    #[test]
    fn headline_marks_undefined_pairs() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 30, 0, 0, 0).unwrap();
        let posts = vec![TimestampedEvent::new(t0 + Duration::hours(1), "Bitcoin", "x")
            .with_sentiment(SentimentScore::new(0.1, 0.1))];
        let trends = vec![TrendPoint::new(t0 + Duration::hours(1), 50.0, 10.0)];
        let prices = PriceSeries::new(vec![
            PriceTick::from_close(t0, 100.0),
            PriceTick::from_close(t0 + Duration::hours(1), 101.0),
        ])
        .into_ticks();

        let report = correlate_records(&posts, &trends, &prices, 60).unwrap();
        let text = headline_text(&report.matrix);

        // One aligned bucket is not enough for a coefficient
        assert!(text.contains("Correlation between price_change and trump_interest: undefined"));
        assert!(text.contains("bitcoin_interest and trump_interest"));
    }

    #[test]
    fn reads_explicit_inputs() {
        let dir = TempDir::new().unwrap();
        let posts = dir.path().join("posts.csv");
        let trends = dir.path().join("trends.csv");
        let prices = dir.path().join("prices.csv");

        let mut post_rows = String::from("created_at,title,sentiment_polarity\n");
        let mut trend_rows = String::from("date,bitcoin_interest,trump_interest\n");
        let mut price_rows = String::from("timestamp,close\n");
        for h in 0..6 {
            post_rows.push_str(&format!("2025-01-29 {h:02}:10:00,Bitcoin post,0.{h}\n"));
            trend_rows.push_str(&format!("2025-01-29 {h:02}:00:00,{},{}\n", 40 + h, 60 - h * h));
            price_rows.push_str(&format!("2025-01-29 {h:02}:00:00,{}\n", 100 + h * h));
        }
        std::fs::write(&posts, post_rows).unwrap();
        std::fs::write(&trends, trend_rows).unwrap();
        std::fs::write(&prices, price_rows).unwrap();

        let args = CorrelateArgs {
            posts: Some(posts),
            trends: Some(trends),
            prices: Some(prices),
            bucket_minutes: Some(60),
        };
        run_correlate(args, &AppConfig::default()).unwrap();
    }

    #[test]
    fn missing_inputs_are_reported() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.paths.data_dir = dir.path().to_string_lossy().to_string();

        let err = run_correlate(CorrelateArgs::default(), &config).unwrap_err();
        assert!(err.to_string().contains("reddit_data"));
    }
}
