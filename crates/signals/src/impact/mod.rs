//! Event-impact analysis.
//!
//! Maps each event onto the price trajectory in a window around it, then
//! reduces the resulting table by categorical dimensions.

mod aggregate;
mod analyzer;
mod report;
mod window;

pub use aggregate::{group_by_key, top_n, AggregateStat, Aggregator, Dimension};
pub use analyzer::{analyze_event, ImpactAnalyzer, ImpactBatch, ImpactResult, SkippedEvent};
pub use report::{groups_to_text, ImpactSummary};
pub use window::ImpactWindow;
