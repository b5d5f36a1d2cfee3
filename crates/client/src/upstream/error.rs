//! Upstream feed client error types.

use std::sync::Arc;

use feedline_core::Error;

/// Errors from the recommendation service client.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The request failed validation before being sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Non-2xx HTTP response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { UpstreamError::Timeout } else { UpstreamError::Network(Arc::new(err)) }
    }
}

impl From<UpstreamError> for Error {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::InvalidRequest(msg) => Error::InvalidInput(msg),
            UpstreamError::HttpError { status } => Error::UpstreamStatus(status),
            UpstreamError::Timeout => Error::UpstreamTimeout(UpstreamError::Timeout.to_string()),
            other => Error::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UpstreamError::HttpError { status: 502 };
        assert!(err.to_string().contains("502"));

        let err = UpstreamError::Parse("expected value".to_string());
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_status_survives_conversion() {
        let err: Error = UpstreamError::HttpError { status: 503 }.into();
        assert!(matches!(err, Error::UpstreamStatus(503)));

        let err: Error = UpstreamError::Timeout.into();
        assert!(matches!(err, Error::UpstreamTimeout(_)));
    }
}
