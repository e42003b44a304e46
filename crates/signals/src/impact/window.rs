//! Price window extraction around an event.

use chrono::{DateTime, Duration, Utc};
use sentiment_core::WindowConfig;
use sentiment_data::PriceTick;

/// Hours of price history considered on each side of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpactWindow {
    pub hours_before: u32,
    pub hours_after: u32,
}

impl Default for ImpactWindow {
    fn default() -> Self {
        Self {
            hours_before: 6,
            hours_after: 6,
        }
    }
}

impl From<WindowConfig> for ImpactWindow {
    fn from(config: WindowConfig) -> Self {
        Self {
            hours_before: config.hours_before,
            hours_after: config.hours_after,
        }
    }
}

impl ImpactWindow {
    pub fn new(hours_before: u32, hours_after: u32) -> Self {
        Self {
            hours_before,
            hours_after,
        }
    }

    /// Inclusive bounds `[t - before, t + after]`, saturating at the
    /// representable date range.
    #[must_use]
    pub fn bounds(&self, event_time: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Duration::try_hours(i64::from(self.hours_before))
            .and_then(|d| event_time.checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = Duration::try_hours(i64::from(self.hours_after))
            .and_then(|d| event_time.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (start, end)
    }

    /// Returns the contiguous run of ticks inside the window.
    ///
    /// `ticks` must be sorted ascending by timestamp.
    #[must_use]
    pub fn slice<'a>(&self, ticks: &'a [PriceTick], event_time: DateTime<Utc>) -> &'a [PriceTick] {
        let (start, end) = self.bounds(event_time);
        let lo = ticks.partition_point(|t| t.timestamp < start);
        let hi = ticks.partition_point(|t| t.timestamp <= end);
        &ticks[lo..hi.max(lo)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, hour, 0, 0).unwrap()
    }

    fn hourly(from: u32, to: u32) -> Vec<PriceTick> {
        (from..=to)
            .map(|h| PriceTick::from_close(at(h), 100.0 + f64::from(h)))
            .collect()
    }

    #[test]
    fn test_bounds_are_symmetric_by_default() {
        let (start, end) = ImpactWindow::default().bounds(at(12));
        assert_eq!(start, at(6));
        assert_eq!(end, at(18));
    }

    #[test]
    fn test_slice_includes_both_endpoints() {
        let ticks = hourly(0, 23);
        let window = ImpactWindow::new(1, 1).slice(&ticks, at(10));

        let times: Vec<_> = window.iter().map(|t| t.timestamp).collect();
        assert_eq!(times, vec![at(9), at(10), at(11)]);
    }

    #[test]
    fn test_slice_between_ticks() {
        let ticks = hourly(0, 23);
        let event = at(10) + Duration::minutes(30);
        let window = ImpactWindow::new(0, 0).slice(&ticks, event);
        assert!(window.is_empty());

        let window = ImpactWindow::new(1, 0).slice(&ticks, event);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].timestamp, at(10));
    }

    #[test]
    fn test_slice_outside_series_is_empty() {
        let ticks = hourly(0, 5);
        assert!(ImpactWindow::new(2, 2).slice(&ticks, at(20)).is_empty());
        assert!(ImpactWindow::default().slice(&[], at(3)).is_empty());
    }

    #[test]
    fn test_event_inside_range_always_has_ticks() {
        let ticks = hourly(0, 23);
        for minute in (0..23 * 60).step_by(17) {
            let event = at(0) + Duration::minutes(minute);
            assert!(!ImpactWindow::new(1, 1).slice(&ticks, event).is_empty());
        }
    }

    #[test]
    fn test_huge_window_saturates_and_covers_everything() {
        let ticks = hourly(0, 5);
        let window = ImpactWindow::new(u32::MAX, u32::MAX);

        let (start, end) = window.bounds(at(3));
        assert_eq!(start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(end, DateTime::<Utc>::MAX_UTC);
        assert_eq!(window.slice(&ticks, at(3)).len(), ticks.len());
    }

    #[test]
    fn test_zero_width_window_hits_exact_tick() {
        let ticks = hourly(0, 5);
        let window = ImpactWindow::new(0, 0).slice(&ticks, at(3));
        assert_eq!(window.len(), 1);
    }
}
