//! Unified error types for the users console.

use strum::Display;
use thiserror::Error;

/// Crate-level error type.
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Users API error.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
}

/// Errors raised while talking to the users API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not complete.
    #[error("request to {endpoint} failed: {source}")]
    Network {
        /// Endpoint path that was requested.
        endpoint: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        /// Endpoint path that was requested.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// `error` field of the JSON body, when present.
        message: Option<String>,
    },

    /// The body did not have the expected JSON shape.
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed {
        /// Endpoint path that was requested.
        endpoint: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The endpoint URL could not be built from the base URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse failure classification shown to diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Request could not complete or returned non-2xx.
    NetworkFailure,
    /// Body not parseable as the expected JSON shape.
    MalformedResponse,
}

impl ApiError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network { .. } | ApiError::Status { .. } | ApiError::InvalidUrl(_) => {
                ErrorKind::NetworkFailure
            }
            ApiError::Malformed { .. } => ErrorKind::MalformedResponse,
        }
    }

    /// Human-readable message reported by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ConsoleError>;
