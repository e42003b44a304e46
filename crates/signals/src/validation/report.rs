//! Correlation report generation.
//!
//! Combines the aligned table's descriptive statistics with the correlation
//! matrix and pairwise significance into a human-readable report.

use super::alignment::AlignedTable;
use super::correlation::{Coefficient, CorrelationMatrix, PairwiseCorrelation};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Descriptive statistics for one aligned column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl SeriesSummary {
    /// Summarizes a column; `None` when it is empty.
    #[must_use]
    pub fn from_values(name: &str, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = (values.len() > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });

        Some(Self {
            name: name.to_string(),
            count: values.len(),
            mean,
            std_dev,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Report over one correlation run.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationReport {
    /// First and last aligned bucket
    pub period: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub bucket_minutes: i64,
    pub summaries: Vec<SeriesSummary>,
    pub matrix: CorrelationMatrix,
    pub pairs: Vec<PairwiseCorrelation>,
}

impl CorrelationReport {
    /// Generates the report for an aligned table and its matrix.
    #[must_use]
    pub fn generate(table: &AlignedTable, matrix: CorrelationMatrix, bucket_minutes: i64) -> Self {
        let summaries = table
            .names
            .iter()
            .zip(&table.columns)
            .filter_map(|(name, values)| SeriesSummary::from_values(name, values))
            .collect();
        let pairs = matrix.pairs();

        Self {
            period: table.span(),
            bucket_minutes,
            summaries,
            matrix,
            pairs,
        }
    }

    /// Converts the report to a human-readable text format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("=== Correlation Report ===\n\n");
        match self.period {
            Some((start, end)) => output.push_str(&format!(
                "Period: {} to {}\n",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            )),
            None => output.push_str("Period: no aligned buckets\n"),
        }
        output.push_str(&format!(
            "Bucket: {} min, aligned buckets: {}\n\n",
            self.bucket_minutes, self.matrix.sample_size
        ));

        // Summary statistics
        output.push_str("--- Summary Statistics ---\n");
        for s in &self.summaries {
            output.push_str(&format!(
                "{}: mean {:.4}, std {}, min {:.4}, max {:.4} (n={})\n",
                s.name,
                s.mean,
                s.std_dev.map_or_else(|| "-".to_string(), |v| format!("{v:.4}")),
                s.min,
                s.max,
                s.count
            ));
        }
        output.push('\n');

        // Matrix
        output.push_str("--- Correlation Matrix ---\n");
        let width = self
            .matrix
            .names
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(9);
        output.push_str(&format!("{:width$}", ""));
        for name in &self.matrix.names {
            output.push_str(&format!("  {name:>width$}"));
        }
        output.push('\n');
        for (name, row) in self.matrix.names.iter().zip(&self.matrix.cells) {
            output.push_str(&format!("{name:<width$}"));
            for cell in row {
                let text = match cell {
                    Coefficient::Defined(r) => format!("{r:.4}"),
                    Coefficient::Undefined(_) => "undefined".to_string(),
                };
                output.push_str(&format!("  {text:>width$}"));
            }
            output.push('\n');
        }
        output.push('\n');

        // Pairs
        output.push_str("--- Pairwise Significance ---\n");
        for pair in &self.pairs {
            match (&pair.coefficient, pair.p_value) {
                (Coefficient::Defined(r), Some(p)) => output.push_str(&format!(
                    "{} x {}: r = {:.4}, p = {:.4}{}\n",
                    pair.first,
                    pair.second,
                    r,
                    p,
                    if pair.is_significant() { " (significant)" } else { "" }
                )),
                (Coefficient::Undefined(reason), _) => output.push_str(&format!(
                    "{} x {}: undefined ({})\n",
                    pair.first, pair.second, reason
                )),
                (Coefficient::Defined(r), None) => {
                    output.push_str(&format!("{} x {}: r = {:.4}\n", pair.first, pair.second, r));
                }
            }
        }

        output
    }
}
