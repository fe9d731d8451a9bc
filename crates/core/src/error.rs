//! Error model for calls against the remote directory API.

use thiserror::Error;

/// Result type returned by the request layer and the resource clients.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a single request/response exchange.
///
/// Callers tell the variants apart by [`ApiError::status`]: only an HTTP-level
/// rejection carries a status code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, timeout,
    /// unusable URL).
    #[error("network error: {0}")]
    Transport(String),

    /// The remote API answered with a non-success status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The remote API answered with success but the body was not usable JSON.
    #[error("{0}")]
    Format(String),
}

impl ApiError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// HTTP status of the rejection, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(_) | Self::Format(_) => None,
        }
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(msg) | Self::Format(msg) => msg,
            Self::Http { message, .. } => message,
        }
    }
}

/// Rejection on the authentication surface (login, refresh, gated access).
///
/// A thin relabeling of [`ApiError`]: the message is kept and the status is
/// carried over when there was one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
    pub status: Option<u16>,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Relabel a request failure, substituting `fallback` for an empty message.
    pub fn from_api(err: ApiError, fallback: &str) -> Self {
        let status = err.status();
        let message = match err.message() {
            "" => fallback.to_string(),
            msg => msg.to_string(),
        };
        Self { message, status }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        Self::from_api(err, "request failed")
    }
}
