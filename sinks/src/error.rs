//! Error types for report sinks.

use thiserror::Error;

/// Errors raised by a single sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing a report file failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The email request could not be sent.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The email provider answered with a non-success status.
    #[error("email provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Required settings for the sink are absent.
    #[error("missing settings: {}", .missing.join(", "))]
    Unconfigured { missing: Vec<String> },
}

/// Convenience alias for results with [`SinkError`].
pub type Result<T> = std::result::Result<T, SinkError>;
