//! run CLI command: collect posts, trends, and prices, then correlate.

use super::collect::Collection;
use super::correlate::{correlate_records, headline_text};
use anyhow::Result;
use chrono::Utc;
use sentiment_core::AppConfig;
use sentiment_data::{PriceTick, TimestampedEvent, TrendPoint};

/// Logs a failed collection and continues with no records.
fn or_empty<T>(source: &str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::error!(source, error = %e, "Collection failed");
        Vec::new()
    })
}

/// Post-count, mean sentiment, and mean bitcoin interest.
pub fn summary_text(posts: &[TimestampedEvent], trends: &[TrendPoint]) -> String {
    let polarities: Vec<f64> = posts.iter().filter_map(TimestampedEvent::polarity).collect();
    let mean = |values: &[f64]| {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };
    let interest: Vec<f64> = trends.iter().map(|p| p.bitcoin_interest).collect();

    let mut output = String::from("--- Summary ---\n");
    output.push_str(&format!("Total Reddit posts analyzed: {}\n", posts.len()));
    match mean(&polarities) {
        Some(m) => output.push_str(&format!("Average post sentiment: {m:.3}\n")),
        None => output.push_str("Average post sentiment: n/a\n"),
    }
    match mean(&interest) {
        Some(m) => output.push_str(&format!("Average search interest: {m:.2}\n")),
        None => output.push_str("Average search interest: n/a\n"),
    }
    output
}

/// Correlates the three collections, or reports that one of them is empty.
///
/// Returns `None` when there is not enough data.
///
/// # Errors
/// Returns error for a zero bucket width.
pub fn analyze_collected(
    posts: &[TimestampedEvent],
    trends: &[TrendPoint],
    prices: &[PriceTick],
    bucket_minutes: u32,
) -> Result<Option<String>> {
    if posts.is_empty() || trends.is_empty() || prices.is_empty() {
        tracing::warn!(
            posts = posts.len(),
            trends = trends.len(),
            prices = prices.len(),
            "Not enough data collected for analysis"
        );
        return Ok(None);
    }

    let report = correlate_records(posts, trends, prices, bucket_minutes)?;
    let mut output = report.to_text();
    output.push('\n');
    output.push_str(&headline_text(&report.matrix));
    output.push('\n');
    output.push_str(&summary_text(posts, trends));
    Ok(Some(output))
}

/// Runs the end-to-end flow.
///
/// # Errors
/// Returns error for an invalid correlation configuration.
pub async fn run_pipeline(config: &AppConfig) -> Result<()> {
    let collection = Collection::new(config, Utc::now());

    tracing::info!("Collecting Reddit data");
    let posts = or_empty("reddit", collection.posts().await);
    tracing::info!("Collecting Google Trends data");
    let trends = or_empty("trends", collection.trends().await);
    tracing::info!("Collecting price data");
    let prices = or_empty("prices", collection.prices().await);

    match analyze_collected(&posts, &trends, &prices, config.correlation.bucket_minutes)? {
        Some(text) => println!("{text}"),
        None => println!("Not enough data collected for analysis"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sentiment_core::SentimentScore;

    #[test]
    fn empty_collection_is_not_an_error() {
        let trends = vec![TrendPoint::new(Utc::now(), 1.0, 1.0)];
        assert!(analyze_collected(&[], &trends, &[], 60).unwrap().is_none());
    }

    #[test]
    fn summary_reports_means() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 30, 0, 0, 0).unwrap();
        let posts = vec![
            TimestampedEvent::new(t0, "Bitcoin", "a").with_sentiment(SentimentScore::new(0.2, 0.0)),
            TimestampedEvent::new(t0, "Bitcoin", "b").with_sentiment(SentimentScore::new(0.4, 0.0)),
            TimestampedEvent::new(t0, "Bitcoin", "c"),
        ];
        let trends = vec![
            TrendPoint::new(t0, 40.0, 1.0),
            TrendPoint::new(t0 + Duration::hours(1), 60.0, 1.0),
        ];

        let text = summary_text(&posts, &trends);
        assert!(text.contains("Total Reddit posts analyzed: 3"));
        assert!(text.contains("Average post sentiment: 0.300"));
        assert!(text.contains("Average search interest: 50.00"));
    }
}
