//! Error types for daily-english.
//!
//! Each layer owns a `thiserror` enum: [`LlmError`] for the gateway and
//! agents, [`StorageError`] for persistence, [`ServiceError`] for the
//! application services and [`Error`] for the CLI edge.

use thiserror::Error;

/// Result alias used by the CLI layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the LLM gateway and the agents built on it.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The selected vendor has no credential configured.
    #[error("{provider} API key is not configured")]
    Configuration {
        /// Vendor whose key is missing.
        provider: &'static str,
    },

    /// The requested vendor name is not one of the supported backends.
    #[error("unsupported LLM provider: {name}")]
    UnsupportedProvider {
        /// Name as it was supplied.
        name: String,
    },

    /// Network failure, timeout, non-success status or a vendor payload
    /// that could not be mapped onto [`ChatResponse`](crate::agent::ChatResponse).
    #[error("upstream LLM call failed{}: {message}", status_suffix(.status))]
    Upstream {
        /// Human-readable cause.
        message: String,
        /// HTTP status, when the vendor answered at all.
        status: Option<u16>,
    },

    /// Model output did not contain JSON of the expected shape.
    #[error("failed to parse model output: {message}")]
    Parse {
        /// What went wrong.
        message: String,
        /// The raw model output.
        content: String,
    },
}

impl LlmError {
    /// Returns `true` if the gateway's retry wrapper may try again.
    ///
    /// Only transport-level failures are retried. Missing credentials and
    /// unknown vendors cannot change between attempts, and parse failures
    /// happen after the transport call has already succeeded.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Shorthand for an [`LlmError::Upstream`] without a status code.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            status: None,
        }
    }

    /// Shorthand for an [`LlmError::Parse`].
    pub fn parse(message: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            content: content.into(),
        }
    }
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// `SQLite` failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A JSON column could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("database connection lock poisoned")]
    Lock,

    /// A stored value is not in the expected format.
    #[error("corrupt record: {message}")]
    Corrupt {
        /// Description of the bad value.
        message: String,
    },
}

/// Errors raised by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The addressed record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request conflicts with the current state of the record.
    #[error("{0}")]
    BadRequest(String),

    /// An LLM call or agent parse failed.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// Builds a [`ServiceError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Builds a [`ServiceError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

/// Top-level error for the command-line interface.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid command usage or arguments.
    #[error("{0}")]
    Command(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Service-level failure.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Persistence failure outside a service call.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Gateway failure outside a service call.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Output could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
