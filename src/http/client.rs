//! HTTP client with built-in retry logic and error handling.

use log::{debug, warn};
use reqwest::Client;

use super::retry::{HttpError, RetryPolicy};

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Performs a GET request with query parameters and returns the response body.
    /// Automatically retries on transient errors.
    #[tracing::instrument(level = "trace", skip(self, query))]
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, HttpError> {
        debug!("GET {} with query {:?}...", url, query);

        self.with_retry("GET", || self.get_text_once(url, query))
            .await
    }

    /// Single request attempt without retry.
    async fn get_text_once(&self, url: &str, query: &[(&str, &str)]) -> Result<String, HttpError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| HttpError::transport(url, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::transport(url, &e))?;

        debug!("{} Returned ({}) : {}", url, status.as_u16(), body);

        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        Ok(body)
    }

    /// Executes an async operation with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, HttpError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, HttpError>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() => {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    warn!(
                        "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                        operation_name,
                        attempt,
                        attempts,
                        e,
                        self.policy.delay.as_millis()
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::StatusCode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/networks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"networks": ["AdColony"]}"#)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let body = client
            .get_text(&format!("{}/networks", url), &[])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, r#"{"networks": ["AdColony"]}"#);
    }

    #[tokio::test]
    async fn test_get_text_with_query() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/plist")
            .match_query(Matcher::UrlEncoded(
                "network_list".into(),
                "AdColony,Applovin".into(),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let body = client
            .get_text(
                &format!("{}/plist", url),
                &[("network_list", "AdColony,Applovin")],
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    async fn test_get_text_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/networks")
            .with_status(404)
            .with_body("no such thing")
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new()).with_policy(fast_policy());
        let err = client
            .get_text(&format!("{}/networks", url), &[])
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            HttpError::Status { status, body, .. } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "no such thing");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_text_server_error_exhausts_retries() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/networks")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new()).with_policy(fast_policy());
        let err = client
            .get_text(&format!("{}/networks", url), &[])
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, HttpError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_get_text_connection_refused() {
        // Bind then drop a listener to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = HttpClient::new(Client::new()).with_policy(RetryPolicy::none());
        let err = client
            .get_text(&format!("http://127.0.0.1:{}/networks", port), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Transport { .. }));
        assert_eq!(err.url(), format!("http://127.0.0.1:{}/networks", port));
    }

    #[tokio::test]
    async fn test_with_retry_retries_on_transient_error() {
        let client = HttpClient::new(Client::new()).with_policy(fast_policy());
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    let current = count.fetch_add(1, Ordering::SeqCst);
                    if current < 2 {
                        Err(HttpError::Transport {
                            url: "http://localhost".to_string(),
                            message: "connection reset".to_string(),
                        })
                    } else {
                        Ok("success after retries")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success after retries");
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_immediate_failure_on_non_retryable() {
        let client = HttpClient::new(Client::new()).with_policy(fast_policy());
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(HttpError::Status {
                        url: "http://localhost".to_string(),
                        status: StatusCode::BAD_REQUEST,
                        body: String::new(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
