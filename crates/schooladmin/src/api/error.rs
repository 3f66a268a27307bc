//! Error types for the remote REST API.

use thiserror::Error;

/// Errors that can occur while talking to the remote API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network/HTTP request failed before a response arrived
    #[error("Network error: {message}")]
    Network { message: String },

    /// Credential missing, expired or not allowed
    #[error("Not authorized (status {status})")]
    Unauthorized { status: u16 },

    /// The requested resource does not exist
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Too many requests
    #[error("Rate limited by the API")]
    RateLimited,

    /// Server-side failure (5xx)
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// Body did not match the expected JSON shape
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },

    /// Circuit breaker is open due to repeated failures
    #[error("Circuit breaker open - too many recent failures")]
    CircuitBreakerOpen,
}

impl ApiError {
    /// Returns true if the caller must obtain a new credential.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Returns true if this error is potentially transient and retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network { .. } | ApiError::Server { .. } | ApiError::RateLimited
        )
    }

    /// Maps a non-success HTTP status to an error.
    pub fn from_status(status: u16, path: &str, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("{path} returned status {status}")
        } else {
            format!("{path} returned status {status}: {}", truncate(body, 200))
        };

        match status {
            401 | 403 => ApiError::Unauthorized { status },
            404 => ApiError::NotFound {
                path: path.to_string(),
            },
            429 => ApiError::RateLimited,
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::UnexpectedResponse { message },
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode {
                message: err.to_string(),
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::UrlError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode {
            message: err.to_string(),
        }
    }
}
