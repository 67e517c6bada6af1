//! Error types for remote API calls.

use thiserror::Error;

/// Result type for remote API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur calling the remote API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never completed (connection refused, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered outside [200, 300).
    ///
    /// The message is the raw response body text.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        message: String,
    },

    /// A 2xx response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Returns true if retrying the call may succeed.
    ///
    /// The engine currently retries every dispatch failure with backoff
    /// and draws no 4xx/5xx distinction; this flag exists for logging
    /// and for callers outside the queue path.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            ApiError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_is_body_text() {
        let err = ApiError::Status {
            status: 422,
            message: "title must not be empty".into(),
        };
        assert_eq!(err.to_string(), "title must not be empty");
    }

    #[test]
    fn retryable_classification() {
        assert!(ApiError::Transport("connection reset".into()).is_retryable());
        assert!(ApiError::Status {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Status {
            status: 404,
            message: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Decode("truncated".into()).is_retryable());
    }
}
