//! Event-impact and correlation analysis for bitcoin sentiment.
//!
//! - [`impact`]: price trajectories around events and their aggregates
//! - [`validation`]: bucket alignment and the correlation matrix
//! - [`categorize`]: announcement tagging and ranking
//! - [`collector`]: source adapters feeding the freshness cache
//! - [`lexicon`]: default polarity scorer

pub mod categorize;
pub mod collector;
pub mod impact;
pub mod lexicon;
pub mod validation;

pub use categorize::{categorize_announcement, rank_announcements, Categorization, CRYPTO_CONTENT_TYPE};

// Re-export collectors for convenience
pub use collector::{
    AnnouncementCollector, CollectorStats, HttpSource, Interval, NewsCollector, PriceCollector,
    RedditCollector, TrendsCollector,
};

pub use impact::{
    analyze_event, groups_to_text, top_n, AggregateStat, Aggregator, Dimension, ImpactAnalyzer,
    ImpactBatch, ImpactResult, ImpactSummary, ImpactWindow, SkippedEvent,
};

pub use lexicon::LexiconScorer;

pub use validation::{
    align_series, market_series, AlignedTable, Coefficient, CorrelationEngine, CorrelationMatrix,
    CorrelationReport, NamedSeries, PairwiseCorrelation, SeriesSummary, UndefinedReason,
};
