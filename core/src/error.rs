//! Error types for the in-process aggregation pipelines.

use thiserror::Error;

/// Errors raised while normalizing or aggregating materialized records.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// A text timestamp did not match any accepted format.
    #[error("unparseable timestamp '{value}'")]
    UnparseableTimestamp { value: String },

    /// A record that passed eligibility filtering lacked a required field.
    #[error("record {record} is missing required field '{field}'")]
    MissingField { record: String, field: &'static str },

    /// Tabular or CSV rendering failed.
    #[error("render error: {0}")]
    Render(String),
}

impl From<csv::Error> for AggregationError {
    fn from(err: csv::Error) -> Self {
        Self::Render(err.to_string())
    }
}

/// Convenience alias for results with [`AggregationError`].
pub type Result<T> = std::result::Result<T, AggregationError>;
