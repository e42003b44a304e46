//! Search-interest data model.

use chrono::{DateTime, Utc};
use sentiment_core::Timestamped;
use serde::{Deserialize, Serialize};

/// Combined search interest for the two tracked keyword groups at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    /// Mean interest across the bitcoin keyword group (0-100)
    pub bitcoin_interest: f64,
    /// Mean interest across the trump keyword group (0-100)
    pub trump_interest: f64,
    /// Percent change vs. the previous point
    pub bitcoin_interest_change: Option<f64>,
    pub trump_interest_change: Option<f64>,
}

impl TrendPoint {
    pub fn new(timestamp: DateTime<Utc>, bitcoin_interest: f64, trump_interest: f64) -> Self {
        Self {
            timestamp,
            bitcoin_interest,
            trump_interest,
            bitcoin_interest_change: None,
            trump_interest_change: None,
        }
    }
}

impl Timestamped for TrendPoint {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Sorts points by time and fills in the percent-change fields.
///
/// A zero previous value leaves the change empty.
pub fn with_interest_changes(mut points: Vec<TrendPoint>) -> Vec<TrendPoint> {
    points.sort_by_key(|p| p.timestamp);

    let change = |from: f64, to: f64| (from != 0.0).then(|| (to - from) / from * 100.0);

    for i in 1..points.len() {
        let (prev_btc, prev_trump) = (points[i - 1].bitcoin_interest, points[i - 1].trump_interest);
        let point = &mut points[i];
        point.bitcoin_interest_change = change(prev_btc, point.bitcoin_interest);
        point.trump_interest_change = change(prev_trump, point.trump_interest);
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_interest_changes() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 29, 0, 0, 0).unwrap();
        let points = with_interest_changes(vec![
            TrendPoint::new(t0 + Duration::hours(1), 60.0, 0.0),
            TrendPoint::new(t0, 50.0, 20.0),
        ]);

        assert_eq!(points[0].timestamp, t0);
        assert_eq!(points[0].bitcoin_interest_change, None);
        assert!((points[1].bitcoin_interest_change.unwrap() - 20.0).abs() < 1e-9);
        assert!((points[1].trump_interest_change.unwrap() + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_previous_interest_has_no_change() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 29, 0, 0, 0).unwrap();
        let points = with_interest_changes(vec![
            TrendPoint::new(t0, 0.0, 10.0),
            TrendPoint::new(t0 + Duration::hours(1), 5.0, 10.0),
        ]);
        assert_eq!(points[1].bitcoin_interest_change, None);
        assert_eq!(points[1].trump_interest_change, Some(0.0));
    }
}
