use std::time::Duration;
use thiserror::Error;

pub const TIMEOUT_MESSAGE: &str =
    "Request timed out. Please check your connection and try again.";
pub const NETWORK_MESSAGE: &str =
    "Unable to connect to the news server. Please check your internet connection.";
pub const SERVER_MESSAGE: &str = "Server error. Please try again later.";

#[derive(Debug, Error)]
pub enum FetchError {
    /// Carries the limit that was exceeded.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("server responded with HTTP {0}")]
    Status(u16),
    #[error("server reported failure: {0}")]
    Api(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// The message shown in the error panel next to the "Try Again" button.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => TIMEOUT_MESSAGE,
            FetchError::Network(_) => NETWORK_MESSAGE,
            _ => SERVER_MESSAGE,
        }
    }
}

impl FetchError {
    /// Classifies a transport error from a request that was given `limit`.
    pub fn from_reqwest(e: reqwest::Error, limit: Duration) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(limit)
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_decode() || e.is_body() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}
