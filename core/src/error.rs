//! Error types for the NOWPayments client.
//!
//! # Design
//! A single `ApiError` reaches the caller, but every variant belongs to one of
//! three kinds (see [`ErrorKind`]): the input was rejected before anything was
//! sent, the round-trip itself failed, or the server answered with something
//! the client could not map. Transport failures keep their original message
//! and source.

use crate::http::TransportError;

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally; no request was sent.
    Validation,
    /// No usable response: network failure or a non-2xx status.
    Transport,
    /// A 2xx response whose body did not have the expected shape.
    Response,
}

/// Errors returned by the client, the request builders and the mapper.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An argument failed range or enumeration validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The client configuration is unusable (bad base URL, missing key).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The request body could not be serialized.
    #[error("request serialization failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The transport could not complete the round-trip.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not JSON, or a field has the wrong type.
    #[error("response decoding failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// A required key is absent from the response JSON.
    #[error("response json doesn't have the {0} field")]
    MissingField(String),

    /// The response JSON is not the container the operation expects.
    #[error("response json is not {expected}")]
    UnexpectedShape { expected: &'static str },
}

impl ApiError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidInput(_) | ApiError::Config(_) | ApiError::Encode(_) => {
                ErrorKind::Validation
            }
            ApiError::Transport(_) | ApiError::Status { .. } => ErrorKind::Transport,
            ApiError::Decode(_) | ApiError::MissingField(_) | ApiError::UnexpectedShape { .. } => {
                ErrorKind::Response
            }
        }
    }

    /// The field named by a `MissingField` error.
    pub fn missing_field(&self) -> Option<&str> {
        match self {
            ApiError::MissingField(field) => Some(field),
            _ => None,
        }
    }
}
