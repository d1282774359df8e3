//! Error taxonomy for the service client
//!
//! Every transport maps onto these kinds; callers branch on the kind, not
//! on status codes.

use thiserror::Error;

/// Errors from service calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401/403: terminal for the current session, never retried silently
    #[error("not authenticated (HTTP {status})")]
    Auth { status: u16 },

    /// 404: the referenced book or part no longer exists
    #[error("resource not found: {0}")]
    NotFound(String),

    /// 409, e.g. a duplicate upload
    #[error("conflict: {0}")]
    Conflict(String),

    /// Network failures and 5xx, safe to retry
    #[error("transient failure: {0}")]
    Transient(String),

    /// Response body did not match the expected schema
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Any status outside the mapped taxonomy
    #[error("unexpected response (HTTP {status}): {message}")]
    Unexpected { status: u16, message: String },
}

impl ApiError {
    /// Whether a retry can reasonably succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient(_))
    }

    /// Whether the caller must re-authenticate
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transient(err.to_string())
        }
    }
}

/// Result type for service calls
pub type ApiResult<T> = Result<T, ApiError>;
