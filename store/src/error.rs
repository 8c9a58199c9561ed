//! Error types for store operations.

use delivery_report_config::ConfigError;
use thiserror::Error;

/// Errors that can occur while reading from or writing to the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required connection setting is absent.
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// The client could not be created or the server did not answer `ping`.
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// Driver failure during a query or write.
    #[error("database error: {0}")]
    DatabaseError(#[from] mongodb::error::Error),

    /// An identifier supplied by the caller is not a valid ObjectId.
    #[error("invalid identifier '{0}': expected a 24-character hex ObjectId")]
    InvalidIdentifier(String),

    /// No document matched a by-identifier lookup.
    #[error("no document with _id {id} in '{collection}' ({total} documents in collection)")]
    NotFound {
        collection: String,
        id: String,
        total: u64,
        /// Truncated rendering of an arbitrary document, when one exists.
        sample: Option<String>,
    },

    /// A stored document lacks a field the record cannot do without.
    #[error("conversion error in '{collection}': {message}")]
    ConversionError { collection: String, message: String },
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
