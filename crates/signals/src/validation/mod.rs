//! Correlation engine for time-bucketed signal series.
//!
//! Series sampled at different native rates (per-post sentiment, hourly
//! search interest, hourly price change) are aligned onto a common bucket grid
//! and compared with Pearson correlation.

mod alignment;
mod correlation;
mod report;
mod series;

pub use alignment::{align_series, bucket_mean, bucket_start, AlignedTable, NamedSeries};
pub use correlation::{
    correlation_p_value, Coefficient, CorrelationEngine, CorrelationMatrix, PairwiseCorrelation,
    UndefinedReason,
};
pub use report::{CorrelationReport, SeriesSummary};
pub use series::{market_series, BITCOIN_INTEREST, HEADLINE_PAIRS, PRICE_CHANGE, SENTIMENT, TRUMP_INTEREST};
