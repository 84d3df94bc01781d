//! Error types for the resource client.
//!
//! # Design
//! Transport failures, non-2xx statuses and parse failures all surface as
//! `ApiError`; the client does not classify them further. A transport
//! failure displays exactly the message of the error that caused it, so
//! callers see the same text the transport produced.

use std::error::Error as StdError;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors returned by `ActiveRecord` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport could not complete the round-trip.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A verb mapping entry names no known HTTP method.
    #[error("unsupported HTTP verb `{0}`")]
    UnsupportedVerb(String),

    /// Filter parameters did not serialize to a key/value mapping.
    #[error("query parameters must be a key/value mapping, got {0}")]
    InvalidParams(String),
}

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping its message. Errors whose
    /// `Display` output is empty fall back to their `Debug` form.
    pub fn from_source<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let message = match err.to_string() {
            m if m.is_empty() => format!("{err:?}"),
            m => m,
        };
        Self {
            message,
            source: Some(Box::new(err)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
