//! Retry logic for network operations with error classification.

use reqwest::StatusCode;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Maximum number of attempts for network operations.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// How often and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// A failed HTTP request.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    /// The request never produced a response (DNS, refused connection, timeout...).
    #[error("{message}")]
    Transport { url: String, message: String },
}

impl HttpError {
    pub fn transport(url: &str, error: &reqwest::Error) -> Self {
        HttpError::Transport {
            url: url.to_string(),
            message: error_chain(error),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            HttpError::Status { url, .. } | HttpError::Transport { url, .. } => url,
        }
    }

    /// Whether sending the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Status { status, .. } => is_retryable_status(*status),
            HttpError::Transport { .. } => true,
        }
    }
}

/// Server errors are transient; client errors won't succeed on retry.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
}

/// Flattens an error and its sources into one line.
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
