//! Data models for collected records.
//!
//! All prices and scores are `f64`; timestamps are UTC.

pub mod event;
pub mod price;
pub mod trend;

pub use event::{Engagement, SentimentBucket, TimestampedEvent};
pub use price::{PriceSeries, PriceTick, TICKS_PER_DAY};
pub use trend::{with_interest_changes, TrendPoint};
