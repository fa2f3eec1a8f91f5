//! Store error types with transient/permanent classification for retry
//! logic.

use thiserror::Error;

/// Error that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    // Availability errors (transient)
    /// The store was unreachable or momentarily refused the operation.
    #[error("store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation did not complete within the store's deadline.
    #[error("store operation timed out: {message}")]
    Timeout { message: String },

    // Request errors (permanent)
    /// A query failed in a way retrying will not fix.
    #[error("store query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A row came back in a shape the caller cannot decode.
    #[error("store row decode failed: {message}")]
    Decode { message: String },
}

impl StoreError {
    /// Build an `Unavailable` error from a message only.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Build a `Query` error from a message only.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    /// Whether retrying with backoff can plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(source) => Self::Unavailable {
                message: source.to_string(),
                source: Some(Box::new(source)),
            },
            sqlx::Error::PoolTimedOut => Self::Timeout {
                message: "connection pool timed out".to_string(),
            },
            sqlx::Error::PoolClosed => Self::unavailable("connection pool closed"),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => Self::Decode {
                message: err.to_string(),
            },
            other => Self::Query {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
