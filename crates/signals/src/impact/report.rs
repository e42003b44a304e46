//! Impact summary report generation.

use super::aggregate::{top_n, AggregateStat, Dimension};
use super::analyzer::{ImpactBatch, ImpactResult};
use chrono::{DateTime, Utc};
use sentiment_data::FILE_STAMP_FORMAT;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Headline statistics for an analyzed batch.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactSummary {
    pub events_analyzed: usize,
    pub events_skipped: usize,
    pub events_without_window: usize,
    /// First and last event time among the results
    pub period: (DateTime<Utc>, DateTime<Utc>),
    pub average_price_change_pct: f64,
    /// Largest `max_change_pct` seen in any window
    pub max_change_pct: f64,
    /// Smallest `min_change_pct` seen in any window
    pub min_change_pct: f64,
    pub most_impactful: Vec<ImpactResult>,
}

impl ImpactSummary {
    /// Summarizes a batch; `None` when it has no results.
    #[must_use]
    pub fn from_batch(batch: &ImpactBatch, top: usize) -> Option<Self> {
        let results = &batch.results;
        let first = results.iter().map(|r| r.event_time).min()?;
        let last = results.iter().map(|r| r.event_time).max()?;

        let n = results.len() as f64;
        Some(Self {
            events_analyzed: results.len(),
            events_skipped: batch.skipped.len(),
            events_without_window: batch.without_window,
            period: (first, last),
            average_price_change_pct: results.iter().map(|r| r.price_change_pct).sum::<f64>() / n,
            max_change_pct: results.iter().map(|r| r.max_change_pct).fold(f64::NEG_INFINITY, f64::max),
            min_change_pct: results.iter().map(|r| r.min_change_pct).fold(f64::INFINITY, f64::min),
            most_impactful: top_n(results, top).into_iter().cloned().collect(),
        })
    }

    /// Path for the results table:
    /// `impact_analysis_{start}_to_{end}_{stamp}.csv`.
    #[must_use]
    pub fn results_path(&self, dir: impl AsRef<Path>, generated_at: DateTime<Utc>) -> PathBuf {
        dir.as_ref().join(format!(
            "impact_analysis_{}_to_{}_{}.csv",
            self.period.0.format("%Y%m%d"),
            self.period.1.format("%Y%m%d"),
            generated_at.format(FILE_STAMP_FORMAT)
        ))
    }

    /// Converts the summary to a human-readable text format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("=== Event Impact Analysis ===\n\n");
        output.push_str(&format!(
            "Period: {} to {}\n",
            self.period.0.format("%Y-%m-%d %H:%M"),
            self.period.1.format("%Y-%m-%d %H:%M")
        ));
        output.push_str(&format!(
            "Events analyzed: {} (skipped: {}, no price data in window: {})\n\n",
            self.events_analyzed, self.events_skipped, self.events_without_window
        ));

        output.push_str(&format!("Average price change: {:.2}%\n", self.average_price_change_pct));
        output.push_str(&format!("Maximum price change: {:.2}%\n", self.max_change_pct));
        output.push_str(&format!("Minimum price change: {:.2}%\n\n", self.min_change_pct));

        output.push_str("--- Most Impactful Events ---\n");
        for result in &self.most_impactful {
            output.push_str(&format!(
                "\n{}: {}\n",
                result.event_time.format("%Y-%m-%d %H:%M"),
                result.title
            ));
            output.push_str(&format!("Price Change: {:.2}%\n", result.price_change_pct));
            output.push_str(&format!(
                "Source: {} ({} {})\n",
                result.source,
                if result.is_direct { "direct" } else { "indirect" },
                result.content_type
            ));
        }

        output
    }
}

/// Renders group statistics as an aligned text table.
#[must_use]
pub fn groups_to_text(dimensions: &[Dimension], stats: &[AggregateStat]) -> String {
    let title: Vec<&str> = dimensions.iter().map(Dimension::as_str).collect();
    let mut output = format!("--- Impact by {} ---\n", title.join(" x "));

    if stats.is_empty() {
        output.push_str("(no groups)\n");
        return output;
    }

    let width = stats
        .iter()
        .map(|s| s.label().len())
        .max()
        .unwrap_or(0)
        .max(5);

    output.push_str(&format!(
        "{:<width$}  {:>5}  {:>8}  {:>8}  {:>8}  {:>6}  {:>8}\n",
        "group", "count", "mean%", "max%", "min%", "conf", "polarity"
    ));

    let optional = |v: Option<f64>, precision: usize| match v {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_string(),
    };

    for stat in stats {
        output.push_str(&format!(
            "{:<width$}  {:>5}  {:>8.2}  {:>8.2}  {:>8.2}  {:>6}  {:>8}\n",
            stat.label(),
            stat.count,
            stat.mean_price_change_pct,
            stat.max_price_change_pct,
            stat.min_price_change_pct,
            optional(stat.mean_confidence, 2),
            optional(stat.mean_polarity, 3),
        ));
    }

    output
}
