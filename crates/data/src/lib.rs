//! Data layer for sentiment/price impact analysis.
//!
//! This crate provides:
//! - Data models for events, price ticks, and search-interest points
//! - Timestamp parsing for the formats collectors write
//! - CSV storage with column validation
//! - A freshness cache that reuses recent collector output

pub mod csv_storage;
pub mod freshness;
pub mod models;
pub mod time;

// Re-export commonly used types
pub use csv_storage::{CsvStorage, EventLoad, RowError, FILE_STAMP_FORMAT};
pub use freshness::{check_freshness, latest_file, CsvRecord, Freshness, FreshnessCache};
pub use time::{format_timestamp, parse_timestamp};

// Re-export models
pub use models::{
    with_interest_changes, Engagement, PriceSeries, PriceTick, SentimentBucket, TimestampedEvent,
    TrendPoint, TICKS_PER_DAY,
};
