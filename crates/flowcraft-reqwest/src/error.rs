//! Transport error types for flowcraft-reqwest.

use flowcraft_core::ErrorKind;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport error type.
///
/// Converted into [`flowcraft_core::Error`] at the provider boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The endpoint URL could not be built.
    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
    /// The server answered with a non-success status.
    #[error("{status}: {message}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Error message from the response body.
        message: String,
    },
    /// The server answered 2xx but reported a failure in the body.
    #[error("{0}")]
    Rejected(String),
}

/// Classifies a non-success HTTP status.
fn status_kind(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::InvalidInput,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Authentication,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::ExternalError,
    }
}

impl From<Error> for flowcraft_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    flowcraft_core::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    flowcraft_core::Error::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    flowcraft_core::Error::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    flowcraft_core::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => flowcraft_core::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::Url(e) => flowcraft_core::Error::configuration()
                .with_message(e.to_string())
                .with_source(e),
            Error::Status { status, message } => {
                flowcraft_core::Error::new(status_kind(status)).with_message(message)
            }
            Error::Rejected(message) => flowcraft_core::Error::external_error().with_message(message),
        }
    }
}
