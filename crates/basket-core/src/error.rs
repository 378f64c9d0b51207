//! Error types for Basket.

use thiserror::Error;

/// Shown when a failure carries neither a server detail nor a description.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum BasketError {
    #[error("Invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Failure of a single call to the remote price service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never produced an HTTP response (connect, timeout, ...).
    #[error("{0}")]
    Transport(String),

    /// Non-2xx response. `detail` is the `detail` field of the error body.
    #[error("Request failed with status code {status}")]
    Status { status: u16, detail: Option<String> },

    /// 2xx response whose body could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// 2xx response in which the service reported its own failure.
    #[error("{0}")]
    Rejected(String),
}

impl ServiceError {
    /// Message supplied by the server, if any.
    pub fn server_detail(&self) -> Option<&str> {
        let detail = match self {
            ServiceError::Status { detail, .. } => detail.as_deref(),
            ServiceError::Rejected(message) => Some(message.as_str()),
            ServiceError::Transport(_) | ServiceError::Malformed(_) => None,
        };
        detail.filter(|d| !d.trim().is_empty())
    }

    /// Text shown to the user: server detail, else the error's own
    /// description, else a generic fallback.
    pub fn user_message(&self) -> String {
        if let Some(detail) = self.server_detail() {
            return detail.to_string();
        }
        let description = self.to_string();
        if description.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            description
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Malformed(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}
