//! Price tick data model.
//!
//! Hourly OHLCV observations plus the percent changes derived from them.

use chrono::{DateTime, Utc};
use sentiment_core::Timestamped;
use serde::{Deserialize, Serialize};

/// Number of ticks spanning 24 hours of hourly data.
pub const TICKS_PER_DAY: usize = 24;

/// One OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Candle open time, nominally hour-aligned
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Percent change of close vs. the previous tick
    pub price_change: Option<f64>,
    /// Percent change of close vs. the tick 24 positions earlier
    pub price_change_24h: Option<f64>,
}

impl PriceTick {
    /// Creates a tick with no derived fields.
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            price_change: None,
            price_change_24h: None,
        }
    }

    /// Creates a tick where every price equals `close`.
    pub fn from_close(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self::new(timestamp, close, close, close, close, 0.0)
    }
}

impl Timestamped for PriceTick {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Percent change from `from` to `to`; `None` when `from` is zero.
fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        return None;
    }
    Some((to - from) / from * 100.0)
}

/// A price series sorted strictly ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    ticks: Vec<PriceTick>,
}

impl PriceSeries {
    /// Builds a series: sorts by timestamp, keeps the last tick for duplicate
    /// timestamps, and recomputes the derived percent changes.
    pub fn new(mut ticks: Vec<PriceTick>) -> Self {
        // Stable sort keeps input order among equal timestamps, so the last one wins below.
        ticks.sort_by_key(|t| t.timestamp);

        let mut deduped: Vec<PriceTick> = Vec::with_capacity(ticks.len());
        for tick in ticks {
            match deduped.last_mut() {
                Some(last) if last.timestamp == tick.timestamp => *last = tick,
                _ => deduped.push(tick),
            }
        }

        for i in 0..deduped.len() {
            let close = deduped[i].close;
            let change = i
                .checked_sub(1)
                .and_then(|p| percent_change(deduped[p].close, close));
            let change_24h = i
                .checked_sub(TICKS_PER_DAY)
                .and_then(|p| percent_change(deduped[p].close, close));
            deduped[i].price_change = change;
            deduped[i].price_change_24h = change_24h;
        }

        Self { ticks: deduped }
    }

    /// Returns the ticks in ascending order.
    #[must_use]
    pub fn ticks(&self) -> &[PriceTick] {
        &self.ticks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// First and last timestamps, if any.
    #[must_use]
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.ticks.first()?.timestamp, self.ticks.last()?.timestamp))
    }

    /// Consumes the series.
    #[must_use]
    pub fn into_ticks(self) -> Vec<PriceTick> {
        self.ticks
    }
}

impl From<Vec<PriceTick>> for PriceSeries {
    fn from(ticks: Vec<PriceTick>) -> Self {
        Self::new(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hour(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    #[test]
    fn test_series_sorts_ascending() {
        let series = PriceSeries::new(vec![
            PriceTick::from_close(hour(2), 102.0),
            PriceTick::from_close(hour(0), 100.0),
            PriceTick::from_close(hour(1), 101.0),
        ]);

        let times: Vec<_> = series.ticks().iter().map(|t| t.timestamp).collect();
        assert_eq!(times, vec![hour(0), hour(1), hour(2)]);
    }

    #[test]
    fn test_duplicate_timestamps_last_wins() {
        let series = PriceSeries::new(vec![
            PriceTick::from_close(hour(0), 100.0),
            PriceTick::from_close(hour(1), 50.0),
            PriceTick::from_close(hour(1), 110.0),
        ]);

        assert_eq!(series.len(), 2);
        assert_eq!(series.ticks()[1].close, 110.0);
    }

    #[test]
    fn test_price_change_derived() {
        let series = PriceSeries::new(vec![
            PriceTick::from_close(hour(0), 100.0),
            PriceTick::from_close(hour(1), 110.0),
            PriceTick::from_close(hour(2), 99.0),
        ]);

        assert_eq!(series.ticks()[0].price_change, None);
        let second = series.ticks()[1].price_change.unwrap();
        assert!((second - 10.0).abs() < 1e-9);
        let third = series.ticks()[2].price_change.unwrap();
        assert!((third + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_change_24h_needs_full_day() {
        let ticks: Vec<_> = (0..26)
            .map(|h| PriceTick::from_close(hour(h), 100.0 + h as f64))
            .collect();
        let series = PriceSeries::new(ticks);

        assert_eq!(series.ticks()[23].price_change_24h, None);
        let change = series.ticks()[24].price_change_24h.unwrap();
        assert!((change - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_previous_close_has_no_change() {
        let series = PriceSeries::new(vec![
            PriceTick::from_close(hour(0), 0.0),
            PriceTick::from_close(hour(1), 10.0),
        ]);
        assert_eq!(series.ticks()[1].price_change, None);
    }

    #[test]
    fn test_span() {
        assert_eq!(PriceSeries::default().span(), None);
        let series = PriceSeries::new(vec![
            PriceTick::from_close(hour(3), 1.0),
            PriceTick::from_close(hour(1), 1.0),
        ]);
        assert_eq!(series.span(), Some((hour(1), hour(3))));
    }
}
