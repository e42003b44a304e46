//! analyze-impact CLI command.
//!
//! Loads an event table and a price table, measures the price trajectory
//! around each event, writes the per-event results, and prints the summary
//! plus group aggregates.

use super::collect::Source;
use super::resolve_input;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use sentiment_core::AppConfig;
use sentiment_data::{parse_timestamp, CsvStorage};
use sentiment_signals::{groups_to_text, Aggregator, Dimension, ImpactAnalyzer, ImpactSummary, ImpactWindow};
use std::path::PathBuf;

/// Arguments for the analyze-impact command.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeImpactArgs {
    /// Event CSV (default: newest announcements file in the data directory)
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Price CSV (default: newest price file in the data directory)
    #[arg(long)]
    pub prices: Option<PathBuf>,

    /// Hours of price data before each event
    #[arg(long)]
    pub hours_before: Option<u32>,

    /// Hours of price data after each event
    #[arg(long)]
    pub hours_after: Option<u32>,

    /// Ignore events before this date (default: collection.start_date)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Number of most impactful events to list
    #[arg(long)]
    pub top_n: Option<usize>,
}

/// Runs the analyze-impact command.
///
/// Returns the written results path, or `None` when there was nothing to write.
///
/// # Errors
/// Returns error if an input cannot be found or loaded, or the results cannot be written.
pub fn run_analyze_impact(args: AnalyzeImpactArgs, config: &AppConfig) -> Result<Option<PathBuf>> {
    let data_dir = &config.paths.data_dir;
    let events_path = resolve_input(args.events, data_dir, Source::Announcements.file_prefix())?;
    let prices_path = resolve_input(args.prices, data_dir, Source::Prices.file_prefix())?;

    let start_date: DateTime<Utc> = match args.start_date.as_deref() {
        Some(raw) => parse_timestamp(raw).with_context(|| format!("Invalid --start-date '{raw}'"))?,
        None => config.collection.start_date,
    };
    let window = ImpactWindow::new(
        args.hours_before.unwrap_or(config.window.hours_before),
        args.hours_after.unwrap_or(config.window.hours_after),
    );
    let top = args.top_n.unwrap_or(config.window.top_n);

    let load = CsvStorage::read_events(&events_path, "events")
        .with_context(|| format!("Failed to load events from {}", events_path.display()))?;
    let prices = CsvStorage::read_prices(&prices_path)
        .with_context(|| format!("Failed to load prices from {}", prices_path.display()))?;

    tracing::info!(
        events = load.events.len(),
        rejected_rows = load.rejected.len(),
        ticks = prices.len(),
        hours_before = window.hours_before,
        hours_after = window.hours_after,
        %start_date,
        "Loaded inputs"
    );

    let batch = ImpactAnalyzer::new(window)
        .with_start_date(start_date)
        .analyze(&load.events, &prices);

    let Some(summary) = ImpactSummary::from_batch(&batch, top) else {
        println!("No events with price data in their window; nothing to report.");
        return Ok(None);
    };

    let results_path = summary.results_path(&config.paths.results_dir, Utc::now());
    CsvStorage::write_rows(&results_path, &batch.results)
        .with_context(|| format!("Failed to write results to {}", results_path.display()))?;

    println!("{}", summary.to_text());

    let aggregator = Aggregator::new(config.categorization.neutral_band);
    for dimension in Dimension::ALL {
        let stats = aggregator.group_by(&batch.results, &[dimension]);
        println!("{}", groups_to_text(&[dimension], &stats));
    }

    if !load.rejected.is_empty() {
        println!("Rows rejected for malformed timestamps: {}", load.rejected.len());
    }
    for skipped in &batch.skipped {
        println!("Skipped {} ({}): {}", skipped.event_time, skipped.title, skipped.error);
    }
    println!("Results saved to: {}", results_path.display());

    Ok(Some(results_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.paths.data_dir = dir.path().join("data").to_string_lossy().to_string();
        config.paths.results_dir = dir.path().join("results").to_string_lossy().to_string();
        config
    }

    fn write_inputs(dir: &TempDir) -> (PathBuf, PathBuf) {
        let prices = dir.path().join("prices.csv");
        let mut csv = String::from("timestamp,close\n");
        for h in 0..12 {
            csv.push_str(&format!("2025-01-29 {:02}:00:00,{}\n", h, 100 + h));
        }
        std::fs::write(&prices, csv).unwrap();

        let events = dir.path().join("events.csv");
        std::fs::write(
            &events,
            "post_time,text,replies,reblogs,favorites\n\
             2025-01-29 05:00:00,Bitcoin will be great,10,20,30\n\
             2024-06-01 05:00:00,Old post,1,1,1\n",
        )
        .unwrap();
        (events, prices)
    }

    #[test]
    fn writes_results_file() {
        let dir = TempDir::new().unwrap();
        let (events, prices) = write_inputs(&dir);
        let args = AnalyzeImpactArgs {
            events: Some(events),
            prices: Some(prices),
            hours_before: Some(2),
            hours_after: Some(2),
            ..Default::default()
        };

        let path = run_analyze_impact(args, &config_for(&dir)).unwrap().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.contains("Bitcoin will be great"));
        assert!(path.starts_with(dir.path().join("results")));
    }

    #[test]
    fn start_date_can_exclude_everything() {
        let dir = TempDir::new().unwrap();
        let (events, prices) = write_inputs(&dir);
        let args = AnalyzeImpactArgs {
            events: Some(events),
            prices: Some(prices),
            start_date: Some("2025-02-01".to_string()),
            ..Default::default()
        };

        let written = run_analyze_impact(args, &config_for(&dir)).unwrap();
        assert!(written.is_none());
    }

    #[test]
    fn bad_start_date_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (events, prices) = write_inputs(&dir);
        let args = AnalyzeImpactArgs {
            events: Some(events),
            prices: Some(prices),
            start_date: Some("someday".to_string()),
            ..Default::default()
        };

        let err = run_analyze_impact(args, &config_for(&dir)).unwrap_err();
        assert!(err.to_string().contains("--start-date"));
    }
}
