//! Event-impact analysis.
//!
//! For each event, the hourly closes inside its window are reduced to a price
//! trajectory: first/last close, extremes, and percent changes relative to the
//! first close. Events are independent of each other.

use super::window::ImpactWindow;
use chrono::{DateTime, Utc};
use sentiment_core::{AnalysisError, Result};
use sentiment_data::{PriceSeries, TimestampedEvent};
use serde::Serialize;

/// Price trajectory around one event.
///
/// Carries the event's categorical and numeric fields so results can be
/// grouped without joining back to the event table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactResult {
    pub event_time: DateTime<Utc>,
    pub title: String,
    pub source: String,
    pub content_type: String,
    pub is_direct: bool,
    pub is_crypto: bool,
    pub sentiment_polarity: Option<f64>,
    pub confidence_score: Option<f64>,
    pub score: i64,
    pub num_comments: u64,
    pub url: Option<String>,
    pub initial_price: f64,
    pub final_price: f64,
    pub max_price: f64,
    pub min_price: f64,
    /// (final - initial) / initial * 100
    pub price_change_pct: f64,
    pub max_change_pct: f64,
    pub min_change_pct: f64,
    /// Number of ticks inside the window
    pub window_ticks: usize,
}

/// An event dropped from a batch because its computation failed.
#[derive(Debug)]
pub struct SkippedEvent {
    pub event_time: DateTime<Utc>,
    pub title: String,
    pub error: AnalysisError,
}

/// Outcome of analyzing a collection of events.
#[derive(Debug, Default)]
pub struct ImpactBatch {
    /// One result per event with at least one tick in its window, in input order
    pub results: Vec<ImpactResult>,
    /// Events whose computation failed
    pub skipped: Vec<SkippedEvent>,
    /// Events with no tick inside their window
    pub without_window: usize,
    /// Events dropped by the start-date filter
    pub before_start: usize,
}

impl ImpactBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn percent_of(initial: f64, value: f64) -> f64 {
    (value - initial) / initial * 100.0
}

/// Computes the impact of one event.
///
/// Returns `Ok(None)` when no tick falls inside the window.
///
/// # Errors
/// `DivisionByZero` when the first close in the window is zero.
pub fn analyze_event(
    event: &TimestampedEvent,
    prices: &PriceSeries,
    window: ImpactWindow,
) -> Result<Option<ImpactResult>> {
    let ticks = window.slice(prices.ticks(), event.timestamp);
    let (Some(first), Some(last)) = (ticks.first(), ticks.last()) else {
        return Ok(None);
    };

    let initial_price = first.close;
    if initial_price == 0.0 {
        return Err(AnalysisError::division_by_zero(format!(
            "initial price at {} is zero",
            first.timestamp
        )));
    }
    let final_price = last.close;

    let max_price = ticks.iter().map(|t| t.close).fold(f64::NEG_INFINITY, f64::max);
    let min_price = ticks.iter().map(|t| t.close).fold(f64::INFINITY, f64::min);

    Ok(Some(ImpactResult {
        event_time: event.timestamp,
        title: event.title.clone(),
        source: event.source.clone(),
        content_type: event.content_type.clone(),
        is_direct: event.is_direct,
        is_crypto: event.is_crypto,
        sentiment_polarity: event.polarity(),
        confidence_score: event.confidence_score,
        score: event.engagement.score,
        num_comments: event.engagement.comments,
        url: event.url.clone(),
        initial_price,
        final_price,
        max_price,
        min_price,
        price_change_pct: percent_of(initial_price, final_price),
        max_change_pct: percent_of(initial_price, max_price),
        min_change_pct: percent_of(initial_price, min_price),
        window_ticks: ticks.len(),
    }))
}

/// Runs [`analyze_event`] over a collection of events.
#[derive(Debug, Clone, Default)]
pub struct ImpactAnalyzer {
    window: ImpactWindow,
    start_date: Option<DateTime<Utc>>,
}

impl ImpactAnalyzer {
    pub fn new(window: ImpactWindow) -> Self {
        Self {
            window,
            start_date: None,
        }
    }

    /// Drops events published before `start_date`.
    #[must_use]
    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn window(&self) -> ImpactWindow {
        self.window
    }

    /// Analyzes every event against the same price series.
    ///
    /// Per-event failures are logged and collected in `skipped`; they never
    /// abort the batch. Empty inputs yield an empty batch.
    pub fn analyze(&self, events: &[TimestampedEvent], prices: &PriceSeries) -> ImpactBatch {
        let mut batch = ImpactBatch::default();

        if events.is_empty() || prices.is_empty() {
            tracing::info!(
                events = events.len(),
                ticks = prices.len(),
                "Nothing to analyze"
            );
            return batch;
        }

        for event in events {
            if self.start_date.is_some_and(|start| event.timestamp < start) {
                batch.before_start += 1;
                continue;
            }

            match analyze_event(event, prices, self.window) {
                Ok(Some(result)) => batch.results.push(result),
                Ok(None) => batch.without_window += 1,
                Err(error) => {
                    tracing::warn!(
                        event_time = %event.timestamp,
                        title = %event.title,
                        error = %error,
                        "Skipping event"
                    );
                    batch.skipped.push(SkippedEvent {
                        event_time: event.timestamp,
                        title: event.title.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            analyzed = batch.results.len(),
            skipped = batch.skipped.len(),
            without_window = batch.without_window,
            before_start = batch.before_start,
            "Impact analysis complete"
        );

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sentiment_core::SentimentScore;
    use sentiment_data::PriceTick;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, hour, 0, 0).unwrap()
    }

    fn series(points: &[(u32, f64)]) -> PriceSeries {
        PriceSeries::new(points.iter().map(|(h, c)| PriceTick::from_close(at(*h), *c)).collect())
    }

    fn event(hour: u32, title: &str) -> TimestampedEvent {
        TimestampedEvent::new(at(hour), "test", title)
    }

    #[test]
    fn test_reference_scenario() {
        let prices = series(&[(9, 100.0), (10, 110.0), (11, 90.0)]);
        let result = analyze_event(&event(10, "A"), &prices, ImpactWindow::new(1, 1))
            .unwrap()
            .unwrap();

        assert_eq!(result.initial_price, 100.0);
        assert_eq!(result.final_price, 90.0);
        assert_eq!(result.max_price, 110.0);
        assert_eq!(result.min_price, 90.0);
        assert!((result.price_change_pct + 10.0).abs() < 1e-9);
        assert!((result.max_change_pct - 10.0).abs() < 1e-9);
        assert!((result.min_change_pct + 10.0).abs() < 1e-9);
        assert_eq!(result.window_ticks, 3);
    }

    #[test]
    fn test_single_tick_window_has_zero_change() {
        let prices = series(&[(10, 123.45)]);
        let result = analyze_event(&event(10, "A"), &prices, ImpactWindow::default())
            .unwrap()
            .unwrap();

        assert_eq!(result.initial_price, result.final_price);
        assert_eq!(result.price_change_pct, 0.0);
        assert_eq!(result.max_change_pct, 0.0);
        assert_eq!(result.min_change_pct, 0.0);
    }

    #[test]
    fn test_unbounded_window_uses_whole_series() {
        let prices = series(&[(8, 100.0), (10, 120.0), (12, 90.0)]);
        let result = analyze_event(&event(10, "A"), &prices, ImpactWindow::new(u32::MAX, 6))
            .unwrap()
            .unwrap();

        assert_eq!(result.window_ticks, 3);
        assert_eq!(result.initial_price, 100.0);
        assert_eq!(result.final_price, 90.0);
    }

    #[test]
    fn test_no_ticks_in_window_is_none() {
        let prices = series(&[(0, 100.0), (1, 101.0)]);
        let result = analyze_event(&event(20, "late"), &prices, ImpactWindow::new(2, 2)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_zero_initial_price_is_division_by_zero() {
        let prices = series(&[(9, 0.0), (10, 50.0)]);
        let err = analyze_event(&event(10, "A"), &prices, ImpactWindow::new(1, 1)).unwrap_err();
        assert!(matches!(err, AnalysisError::DivisionByZero { .. }));
        assert!(err.is_per_event());
    }

    #[test]
    fn test_change_bounds_hold() {
        let prices = series(&[(4, 100.0), (5, 97.0), (6, 104.0), (7, 99.0), (8, 101.0)]);
        for hour in 4..=8 {
            let r = analyze_event(&event(hour, "x"), &prices, ImpactWindow::new(2, 2))
                .unwrap()
                .unwrap();
            assert!(r.max_change_pct >= r.price_change_pct);
            assert!(r.price_change_pct >= r.min_change_pct);
            assert!(r.max_change_pct >= 0.0 && r.min_change_pct <= 0.0);
        }
    }

    #[test]
    fn test_result_carries_event_fields() {
        let prices = series(&[(10, 100.0)]);
        let ev = event(10, "Trump says bitcoin")
            .with_content_type("crypto")
            .with_categorization(true, true, 1.0)
            .with_sentiment(SentimentScore::new(0.4, 0.5))
            .with_url("https://example.com");

        let r = analyze_event(&ev, &prices, ImpactWindow::default()).unwrap().unwrap();
        assert_eq!(r.content_type, "crypto");
        assert!(r.is_direct);
        assert_eq!(r.sentiment_polarity, Some(0.4));
        assert_eq!(r.confidence_score, Some(1.0));
        assert_eq!(r.url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_batch_skips_failures_and_continues() {
        let prices = series(&[(0, 0.0), (5, 100.0), (6, 110.0)]);
        let events = vec![event(0, "zero"), event(6, "ok"), event(20, "no window")];

        let batch = ImpactAnalyzer::new(ImpactWindow::new(1, 1)).analyze(&events, &prices);

        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.results[0].title, "ok");
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].title, "zero");
        assert_eq!(batch.without_window, 1);
    }

    #[test]
    fn test_batch_empty_events_is_empty_result() {
        let prices = series(&[(0, 100.0)]);
        let batch = ImpactAnalyzer::default().analyze(&[], &prices);
        assert!(batch.is_empty());
        assert!(batch.skipped.is_empty());
    }

    #[test]
    fn test_batch_empty_prices_is_empty_result() {
        let batch = ImpactAnalyzer::default().analyze(&[event(1, "a")], &PriceSeries::default());
        assert!(batch.is_empty());
        assert_eq!(batch.without_window, 0);
    }

    #[test]
    fn test_start_date_filter() {
        let prices = series(&[(0, 100.0), (12, 101.0)]);
        let events = vec![event(0, "old"), event(12, "new")];

        let batch = ImpactAnalyzer::new(ImpactWindow::new(1, 1))
            .with_start_date(at(6))
            .analyze(&events, &prices);

        assert_eq!(batch.before_start, 1);
        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.results[0].title, "new");
    }

    #[test]
    fn test_batch_is_order_independent() {
        let prices = series(&[(1, 100.0), (2, 105.0), (3, 95.0), (4, 102.0)]);
        let events = vec![event(1, "a"), event(2, "b"), event(3, "c")];
        let mut reversed = events.clone();
        reversed.reverse();

        let analyzer = ImpactAnalyzer::new(ImpactWindow::new(1, 1));
        let mut forward = analyzer.analyze(&events, &prices).results;
        let mut backward = analyzer.analyze(&reversed, &prices).results;
        forward.sort_by_key(|r| r.event_time);
        backward.sort_by_key(|r| r.event_time);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_minute_resolution_event_times() {
        let prices = series(&[(9, 100.0), (10, 110.0), (11, 120.0)]);
        let ev = TimestampedEvent::new(at(10) + Duration::minutes(20), "x", "t");
        let r = analyze_event(&ev, &prices, ImpactWindow::new(1, 1)).unwrap().unwrap();
        // 09:20..11:20 covers the 10:00 and 11:00 ticks
        assert_eq!(r.initial_price, 110.0);
        assert_eq!(r.final_price, 120.0);
    }
}
