//! HTTP client module with retry logic and error handling.

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{HttpError, MAX_RETRIES, RETRY_DELAY_MS, RetryPolicy, is_retryable_status};
