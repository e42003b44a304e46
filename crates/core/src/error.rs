//! Error types for the analysis pipeline.
//!
//! Errors fall into four families: structural input problems that abort a run,
//! per-event failures that skip one event, empty inputs that end a run cleanly,
//! and statistics that are undefined for the data at hand.

use thiserror::Error;

/// Errors raised while loading or analyzing collected data.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A required column is missing or holds a value of the wrong type.
    #[error("input shape error in field '{field}': {reason}")]
    InputShape {
        /// Offending column/field name.
        field: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A percentage change was requested relative to a zero price.
    #[error("division by zero: {context}")]
    DivisionByZero {
        /// Where the zero denominator came from.
        context: String,
    },

    /// A timestamp could not be parsed.
    #[error("malformed timestamp: '{value}'")]
    MalformedTimestamp {
        /// The raw value as it appeared in the input.
        value: String,
    },

    /// There is nothing to analyze.
    #[error("empty input: {what}")]
    EmptyInput {
        /// Which collection was empty.
        what: String,
    },

    /// A statistic has no defined value for the given data.
    #[error("undefined statistic: {reason}")]
    UndefinedStatistic {
        /// Why the statistic is undefined.
        reason: String,
    },

    /// A caller-supplied parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error.
    #[error("CSV error: {0}")]
    Csv(String),
}

impl AnalysisError {
    /// Creates an input shape error.
    pub fn input_shape(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InputShape {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing-column error.
    pub fn missing_column(field: impl Into<String>) -> Self {
        Self::input_shape(field, "required column is missing")
    }

    /// Creates a division by zero error.
    pub fn division_by_zero(context: impl Into<String>) -> Self {
        Self::DivisionByZero {
            context: context.into(),
        }
    }

    /// Creates a malformed timestamp error.
    pub fn malformed_timestamp(value: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            value: value.into(),
        }
    }

    /// Creates an empty input error.
    pub fn empty_input(what: impl Into<String>) -> Self {
        Self::EmptyInput { what: what.into() }
    }

    /// Creates an undefined statistic error.
    pub fn undefined(reason: impl Into<String>) -> Self {
        Self::UndefinedStatistic {
            reason: reason.into(),
        }
    }

    /// Returns true if the error concerns a single event and the batch may continue.
    #[must_use]
    pub fn is_per_event(&self) -> bool {
        matches!(
            self,
            Self::DivisionByZero { .. } | Self::MalformedTimestamp { .. }
        )
    }

    /// Returns true if the error means the whole run is broken and must abort.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InputShape { .. } | Self::Io(_) | Self::Csv(_) | Self::InvalidParameter(_)
        )
    }

    /// Returns true if the error only signals that there is nothing to analyze.
    #[must_use]
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput { .. })
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
