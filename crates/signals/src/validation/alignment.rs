//! Temporal alignment of irregular series.
//!
//! Every series is bucketed onto the same fixed-width grid (bucket start =
//! timestamp floored to the interval, measured from the Unix epoch) and
//! averaged within each bucket. Series are then inner-joined on bucket start.

use chrono::{DateTime, Duration, Utc};
use sentiment_core::{AnalysisError, Result, Timestamped};
use std::collections::BTreeMap;

/// A named sequence of `(timestamp, value)` observations.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>, points: Vec<(DateTime<Utc>, f64)>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Builds a series from records, skipping those without a value.
    pub fn from_records<T, F>(name: impl Into<String>, records: &[T], value: F) -> Self
    where
        T: Timestamped,
        F: Fn(&T) -> Option<f64>,
    {
        let points = records
            .iter()
            .filter_map(|r| value(r).map(|v| (r.timestamp(), v)))
            .collect();
        Self::new(name, points)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Start of the bucket containing `ts`.
///
/// # Errors
/// `InvalidParameter` when `interval` is not positive.
pub fn bucket_start(ts: DateTime<Utc>, interval: Duration) -> Result<DateTime<Utc>> {
    let width = interval.num_seconds();
    if width <= 0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "bucket interval must be positive, got {}s",
            width
        )));
    }

    let floored = ts.timestamp().div_euclid(width) * width;
    DateTime::from_timestamp(floored, 0)
        .ok_or_else(|| AnalysisError::InvalidParameter(format!("timestamp {ts} out of range")))
}

/// Buckets a series and averages within each bucket.
///
/// Non-finite observations are ignored.
///
/// # Errors
/// `InvalidParameter` when `interval` is not positive.
pub fn bucket_mean(
    points: &[(DateTime<Utc>, f64)],
    interval: Duration,
) -> Result<BTreeMap<DateTime<Utc>, f64>> {
    let mut sums: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();
    for (ts, value) in points {
        if !value.is_finite() {
            continue;
        }
        let entry = sums.entry(bucket_start(*ts, interval)?).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    Ok(sums
        .into_iter()
        .map(|(bucket, (sum, n))| (bucket, sum / n as f64))
        .collect())
}

/// Series aligned on the buckets where all of them have a value.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    pub names: Vec<String>,
    /// Surviving bucket starts, ascending
    pub buckets: Vec<DateTime<Utc>>,
    /// One column per series, parallel to `buckets`
    pub columns: Vec<Vec<f64>>,
}

impl AlignedTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Column for a named series.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.names.iter().position(|n| n == name)?;
        self.columns.get(idx).map(Vec::as_slice)
    }

    /// First and last surviving bucket.
    #[must_use]
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.buckets.first()?, *self.buckets.last()?))
    }
}

/// Buckets every series and inner-joins them on bucket start.
///
/// # Errors
/// `EmptyInput` when no series is given, `InvalidParameter` for a
/// non-positive interval.
pub fn align_series(series: &[NamedSeries], interval: Duration) -> Result<AlignedTable> {
    if series.is_empty() {
        return Err(AnalysisError::empty_input("series to align"));
    }

    let bucketed = series
        .iter()
        .map(|s| bucket_mean(&s.points, interval))
        .collect::<Result<Vec<_>>>()?;

    let buckets: Vec<DateTime<Utc>> = bucketed[0]
        .keys()
        .filter(|bucket| bucketed[1..].iter().all(|other| other.contains_key(*bucket)))
        .copied()
        .collect();

    let columns = bucketed
        .iter()
        .map(|values| {
            buckets
                .iter()
                .filter_map(|bucket| values.get(bucket).copied())
                .collect()
        })
        .collect();

    tracing::debug!(
        series = series.len(),
        buckets = buckets.len(),
        interval_minutes = interval.num_minutes(),
        "Aligned series"
    );

    Ok(AlignedTable {
        names: series.iter().map(|s| s.name.clone()).collect(),
        buckets,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_bucket_start_floors() {
        let hour = Duration::hours(1);
        assert_eq!(bucket_start(at(10, 59), hour).unwrap(), at(10, 0));
        assert_eq!(bucket_start(at(10, 0), hour).unwrap(), at(10, 0));
        assert_eq!(bucket_start(at(10, 44), Duration::minutes(15)).unwrap(), at(10, 30));
    }

    #[test]
    fn test_bucket_start_before_epoch() {
        let ts = Utc.with_ymd_and_hms(1969, 12, 31, 23, 30, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(1969, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(bucket_start(ts, Duration::hours(1)).unwrap(), expected);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = bucket_start(at(1, 0), Duration::zero()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
    }

    #[test]
    fn test_bucket_mean_averages() {
        let points = vec![
            (at(10, 5), 1.0),
            (at(10, 50), 3.0),
            (at(11, 0), 10.0),
            (at(11, 1), f64::NAN),
        ];
        let buckets = bucket_mean(&points, Duration::hours(1)).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[&at(10, 0)], 2.0);
        assert_eq!(buckets[&at(11, 0)], 10.0);
    }

    #[test]
    fn test_inner_join_drops_partial_buckets() {
        let a = NamedSeries::new("a", vec![(at(9, 10), 1.0), (at(10, 10), 2.0), (at(11, 10), 3.0)]);
        let b = NamedSeries::new("b", vec![(at(10, 30), 20.0), (at(11, 30), 30.0), (at(12, 30), 40.0)]);

        let table = align_series(&[a, b], Duration::hours(1)).unwrap();

        assert_eq!(table.buckets, vec![at(10, 0), at(11, 0)]);
        assert_eq!(table.column("a").unwrap(), &[2.0, 3.0]);
        assert_eq!(table.column("b").unwrap(), &[20.0, 30.0]);
        assert_eq!(table.span(), Some((at(10, 0), at(11, 0))));
    }

    #[test]
    fn test_no_overlap_is_empty_table() {
        let a = NamedSeries::new("a", vec![(at(1, 0), 1.0)]);
        let b = NamedSeries::new("b", vec![(at(5, 0), 1.0)]);
        let table = align_series(&[a, b], Duration::hours(1)).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns, vec![Vec::<f64>::new(), Vec::new()]);
    }

    #[test]
    fn test_no_series_is_empty_input() {
        let err = align_series(&[], Duration::hours(1)).unwrap_err();
        assert!(err.is_empty_input());
    }
}
