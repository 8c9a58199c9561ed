//! Job-level error taxonomy.
//!
//! Library errors are folded into [`JobError`] at the job boundary so that
//! `main` can report every failure the same way.

use delivery_report_config::ConfigError;
use delivery_report_core::AggregationError;
use delivery_report_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The override file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("{message}")]
    NotFound {
        message: String,
        /// Truncated sample document from the searched collection.
        sample: Option<String>,
    },

    #[error("aggregation failure: {0}")]
    AggregationFailure(String),

    /// Console output could not be written. Failures of the store, file
    /// and email sinks are recorded in the outcomes instead.
    #[error("sink failure: {0}")]
    SinkFailure(String),
}

impl From<ConfigError> for JobError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { key } => Self::ConfigurationMissing(key),
            other => Self::ConfigurationInvalid(other.to_string()),
        }
    }
}

impl From<std::io::Error> for JobError {
    fn from(err: std::io::Error) -> Self {
        Self::SinkFailure(format!("console: {err}"))
    }
}

impl From<AggregationError> for JobError {
    fn from(err: AggregationError) -> Self {
        Self::AggregationFailure(err.to_string())
    }
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConfigError(err) => err.into(),
            StoreError::ConnectionError(message) => Self::ConnectionError(message),
            StoreError::InvalidIdentifier(raw) => Self::InvalidIdentifier(format!(
                "'{raw}' is not a 24-character hex ObjectId"
            )),
            StoreError::NotFound {
                collection,
                id,
                total,
                sample,
            } => Self::NotFound {
                message: format!(
                    "no document with _id {id} in '{collection}' ({total} documents in collection)"
                ),
                sample,
            },
            other => Self::AggregationFailure(other.to_string()),
        }
    }
}

/// Convenience alias for job results.
pub type Result<T> = std::result::Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_maps_to_configuration_missing() {
        let err: JobError = StoreError::ConfigError(ConfigError::Missing {
            key: "PROD_MONGO_URI".to_string(),
        })
        .into();
        assert_eq!(err.to_string(), "configuration missing: PROD_MONGO_URI");
    }

    #[test]
    fn test_unreadable_file_is_invalid_not_missing() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: JobError = ConfigError::IoError(io).into();
        assert!(matches!(err, JobError::ConfigurationInvalid(_)));
        assert!(err.to_string().starts_with("invalid configuration: I/O error"));
    }

    #[test]
    fn test_not_found_keeps_sample() {
        let err: JobError = StoreError::NotFound {
            collection: "organizations".to_string(),
            id: "64a1f0c2e4b0a1b2c3d4e5f6".to_string(),
            total: 3,
            sample: Some("{ \"name\": \"Acme\" }".to_string()),
        }
        .into();
        match err {
            JobError::NotFound { message, sample } => {
                assert!(message.contains("3 documents"));
                assert_eq!(sample.as_deref(), Some("{ \"name\": \"Acme\" }"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_identifier_and_decode_errors() {
        let err: JobError = StoreError::InvalidIdentifier("abc".to_string()).into();
        assert!(matches!(err, JobError::InvalidIdentifier(_)));

        let err: JobError = StoreError::ConversionError {
            collection: "contacts".to_string(),
            message: "missing _id".to_string(),
        }
        .into();
        assert!(matches!(err, JobError::AggregationFailure(_)));
    }
}
