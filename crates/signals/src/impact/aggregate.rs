//! Group-level statistics over impact results.

use super::analyzer::ImpactResult;
use sentiment_data::SentimentBucket;
use serde::Serialize;
use std::collections::BTreeMap;

/// Categorical dimension an impact result can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    ContentType,
    /// "direct" / "indirect"
    Directness,
    Source,
    /// Polarity bucket; results without a polarity have no key
    SentimentBucket,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::ContentType,
        Dimension::Directness,
        Dimension::Source,
        Dimension::SentimentBucket,
    ];

    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::ContentType => "content_type",
            Dimension::Directness => "directness",
            Dimension::Source => "source",
            Dimension::SentimentBucket => "sentiment",
        }
    }

    /// Extracts this dimension's value from a result.
    #[must_use]
    pub fn key(&self, result: &ImpactResult, neutral_band: f64) -> Option<String> {
        match self {
            Dimension::ContentType => Some(result.content_type.clone()),
            Dimension::Directness => Some(if result.is_direct { "direct" } else { "indirect" }.to_string()),
            Dimension::Source => Some(result.source.clone()),
            Dimension::SentimentBucket => result
                .sentiment_polarity
                .map(|p| SentimentBucket::from_polarity(p, neutral_band).as_str().to_string()),
        }
    }
}

/// Summary statistics for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStat {
    /// One value per grouping dimension
    pub key: Vec<String>,
    pub count: usize,
    pub mean_price_change_pct: f64,
    pub max_price_change_pct: f64,
    pub min_price_change_pct: f64,
    /// Mean over members that carry a confidence score
    pub mean_confidence: Option<f64>,
    /// Mean over members that carry a polarity
    pub mean_polarity: Option<f64>,
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl AggregateStat {
    /// Builds the statistics for a non-empty group.
    fn from_members(key: Vec<String>, members: &[&ImpactResult]) -> Option<Self> {
        let changes = || members.iter().map(|r| r.price_change_pct);
        let mean = mean_of(changes())?;

        Some(Self {
            key,
            count: members.len(),
            mean_price_change_pct: mean,
            max_price_change_pct: changes().fold(f64::NEG_INFINITY, f64::max),
            min_price_change_pct: changes().fold(f64::INFINITY, f64::min),
            mean_confidence: mean_of(members.iter().filter_map(|r| r.confidence_score)),
            mean_polarity: mean_of(members.iter().filter_map(|r| r.sentiment_polarity)),
        })
    }

    /// Key values joined for display.
    #[must_use]
    pub fn label(&self) -> String {
        self.key.join(" / ")
    }
}

/// Groups results by an arbitrary key selector.
///
/// Results whose selector returns `None` are left out. Output is sorted by key
/// and never contains an empty group.
pub fn group_by_key<F>(results: &[ImpactResult], selector: F) -> Vec<AggregateStat>
where
    F: Fn(&ImpactResult) -> Option<Vec<String>>,
{
    let mut groups: BTreeMap<Vec<String>, Vec<&ImpactResult>> = BTreeMap::new();
    for result in results {
        if let Some(key) = selector(result) {
            groups.entry(key).or_default().push(result);
        }
    }

    groups
        .into_iter()
        .filter_map(|(key, members)| AggregateStat::from_members(key, &members))
        .collect()
}

/// Groups results by one or more dimensions.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    neutral_band: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self { neutral_band: 0.05 }
    }
}

impl Aggregator {
    pub fn new(neutral_band: f64) -> Self {
        Self { neutral_band }
    }

    /// Per-group statistics for the combination of `dimensions`.
    ///
    /// A result missing any of the dimension values is excluded.
    pub fn group_by(&self, results: &[ImpactResult], dimensions: &[Dimension]) -> Vec<AggregateStat> {
        group_by_key(results, |r| {
            dimensions
                .iter()
                .map(|d| d.key(r, self.neutral_band))
                .collect::<Option<Vec<_>>>()
        })
    }
}

/// The `n` results with the largest price change, newest first among ties.
pub fn top_n(results: &[ImpactResult], n: usize) -> Vec<&ImpactResult> {
    let mut ranked: Vec<&ImpactResult> = results.iter().collect();
    ranked.sort_by(|a, b| {
        b.price_change_pct
            .total_cmp(&a.price_change_pct)
            .then_with(|| b.event_time.cmp(&a.event_time))
    });
    ranked.truncate(n);
    ranked
}
