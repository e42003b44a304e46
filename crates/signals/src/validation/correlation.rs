//! Correlation analysis across aligned series.
//!
//! Provides a Pearson correlation matrix over bucketed, inner-joined series,
//! with pairwise p-values. Degenerate pairs are reported as undefined rather
//! than as 0.

use super::alignment::{align_series, AlignedTable, NamedSeries};
use chrono::Duration;
use sentiment_core::{AnalysisError, CorrelationConfig, Result};
use serde::Serialize;
use std::fmt;

/// Why a coefficient could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UndefinedReason {
    /// Fewer than two aligned buckets
    InsufficientSamples { samples: usize },
    /// The named series is constant over the aligned buckets
    ZeroVariance { series: String },
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndefinedReason::InsufficientSamples { samples } => {
                write!(f, "need at least 2 aligned buckets, got {samples}")
            }
            UndefinedReason::ZeroVariance { series } => write!(f, "series '{series}' has zero variance"),
        }
    }
}

/// A correlation coefficient or the reason it is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Coefficient {
    Defined(f64),
    Undefined(UndefinedReason),
}

impl Coefficient {
    /// The coefficient value, if defined.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Coefficient::Defined(r) => Some(*r),
            Coefficient::Undefined(_) => None,
        }
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        matches!(self, Coefficient::Defined(_))
    }

    /// Converts into a `Result`, mapping undefined to `UndefinedStatistic`.
    ///
    /// # Errors
    /// `UndefinedStatistic` when the coefficient is undefined.
    pub fn into_result(self) -> Result<f64> {
        match self {
            Coefficient::Defined(r) => Ok(r),
            Coefficient::Undefined(reason) => Err(AnalysisError::undefined(reason.to_string())),
        }
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Calculates the Pearson correlation coefficient between two named columns.
fn pearson(x_name: &str, x: &[f64], y_name: &str, y: &[f64]) -> Coefficient {
    let n = x.len().min(y.len());
    if n < 2 {
        return Coefficient::Undefined(UndefinedReason::InsufficientSamples { samples: n });
    }
    for (name, values) in [(x_name, x), (y_name, y)] {
        if is_constant(values) {
            return Coefficient::Undefined(UndefinedReason::ZeroVariance {
                series: name.to_string(),
            });
        }
    }

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 {
        let series = if var_x == 0.0 { x_name } else { y_name };
        return Coefficient::Undefined(UndefinedReason::ZeroVariance {
            series: series.to_string(),
        });
    }

    Coefficient::Defined((covariance / denominator).clamp(-1.0, 1.0))
}

/// Calculates the p-value for a correlation using t-distribution approximation.
///
/// Uses the transformation: t = r * sqrt(n-2) / sqrt(1 - r^2)
/// which follows a t-distribution with n-2 degrees of freedom.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }

    let r_clamped = r.clamp(-0.9999, 0.9999);
    let df = n as f64 - 2.0;
    let t_stat = r_clamped * (df / (1.0 - r_clamped * r_clamped)).sqrt();

    // Normal approximation; conservative for small samples
    let p = 2.0 * (1.0 - standard_normal_cdf(t_stat.abs()));
    p.clamp(0.0, 1.0)
}

/// Standard normal CDF approximation.
fn standard_normal_cdf(x: f64) -> f64 {
    if x < 0.0 {
        return 1.0 - standard_normal_cdf(-x);
    }

    let b1 = 0.319_381_530;
    let b2 = -0.356_563_782;
    let b3 = 1.781_477_937;
    let b4 = -1.821_255_978;
    let b5 = 1.330_274_429;
    let p = 0.231_641_9;

    let t = 1.0 / (1.0 + p * x);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let pdf = (-x * x / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt();
    1.0 - pdf * (b1 * t + b2 * t2 + b3 * t3 + b4 * t4 + b5 * t5)
}

/// Correlation between one pair of series.
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseCorrelation {
    pub first: String,
    pub second: String,
    pub coefficient: Coefficient,
    /// Two-tailed p-value, present when the coefficient is defined
    pub p_value: Option<f64>,
    pub sample_size: usize,
}

impl PairwiseCorrelation {
    /// Returns true if the correlation is statistically significant at alpha = 0.05.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.p_value.is_some_and(|p| p < 0.05)
    }
}

/// Symmetric matrix of pairwise coefficients.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    /// Number of buckets that survived the inner join
    pub sample_size: usize,
    pub cells: Vec<Vec<Coefficient>>,
}

impl CorrelationMatrix {
    /// Computes the matrix over an aligned table.
    #[must_use]
    pub fn from_table(table: &AlignedTable) -> Self {
        let n = table.names.len();
        let samples = table.len();

        let mut cells = vec![vec![Coefficient::Defined(1.0); n]; n];
        for i in 0..n {
            if samples < 2 {
                cells[i][i] = Coefficient::Undefined(UndefinedReason::InsufficientSamples { samples });
            }
            for j in (i + 1)..n {
                let coefficient = pearson(
                    &table.names[i],
                    &table.columns[i],
                    &table.names[j],
                    &table.columns[j],
                );
                cells[i][j] = coefficient.clone();
                cells[j][i] = coefficient;
            }
        }

        Self {
            names: table.names.clone(),
            sample_size: samples,
            cells,
        }
    }

    /// Coefficient between two named series.
    #[must_use]
    pub fn get(&self, first: &str, second: &str) -> Option<&Coefficient> {
        let i = self.names.iter().position(|n| n == first)?;
        let j = self.names.iter().position(|n| n == second)?;
        Some(&self.cells[i][j])
    }

    /// Every unordered pair of distinct series, in name order of the matrix.
    #[must_use]
    pub fn pairs(&self) -> Vec<PairwiseCorrelation> {
        let n = self.names.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                let coefficient = self.cells[i][j].clone();
                let p_value = coefficient
                    .value()
                    .map(|r| correlation_p_value(r, self.sample_size));
                pairs.push(PairwiseCorrelation {
                    first: self.names[i].clone(),
                    second: self.names[j].clone(),
                    coefficient,
                    p_value,
                    sample_size: self.sample_size,
                });
            }
        }
        pairs
    }
}

/// Buckets, aligns, and correlates named series.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationEngine {
    interval: Duration,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self {
            interval: Duration::hours(1),
        }
    }
}

impl CorrelationEngine {
    /// Creates an engine with the given bucket width.
    ///
    /// # Errors
    /// `InvalidParameter` when `interval` is not positive.
    pub fn new(interval: Duration) -> Result<Self> {
        if interval <= Duration::zero() {
            return Err(AnalysisError::InvalidParameter(format!(
                "bucket interval must be positive, got {}s",
                interval.num_seconds()
            )));
        }
        Ok(Self { interval })
    }

    /// Creates an engine from configuration.
    ///
    /// # Errors
    /// `InvalidParameter` when `bucket_minutes` is zero.
    pub fn from_config(config: &CorrelationConfig) -> Result<Self> {
        Self::new(Duration::minutes(i64::from(config.bucket_minutes)))
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Aligns the series and computes their correlation matrix.
    ///
    /// # Errors
    /// `EmptyInput` when no series is given.
    pub fn correlate(&self, series: &[NamedSeries]) -> Result<(AlignedTable, CorrelationMatrix)> {
        let table = align_series(series, self.interval)?;
        let matrix = CorrelationMatrix::from_table(&table);

        let undefined = matrix
            .cells
            .iter()
            .flatten()
            .filter(|c| !c.is_defined())
            .count();
        tracing::info!(
            series = series.len(),
            aligned_buckets = table.len(),
            undefined_cells = undefined,
            "Computed correlation matrix"
        );

        Ok((table, matrix))
    }
}
