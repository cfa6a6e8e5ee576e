//! HTTP client abstraction for the routing collaborator.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::RoutingError;

/// Default request timeout for routing calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for HTTP GET operations against the routing service.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait RoutingHttpClient: Send + Sync {
    /// Perform an HTTP GET request, returning the response body.
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, RoutingError>> + Send + 'a>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestRoutingClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestRoutingClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self, RoutingError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                RoutingError::Unavailable(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, timeout })
    }
}

impl RoutingHttpClient for ReqwestRoutingClient {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, RoutingError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await.map_err(|e| {
                if e.is_timeout() {
                    RoutingError::Timeout(self.timeout)
                } else {
                    RoutingError::Unavailable(format!("request failed: {}", e))
                }
            })?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(RoutingError::NotPermitted(format!("HTTP {} from {}", status, url)));
            }
            if !status.is_success() {
                return Err(RoutingError::Unavailable(format!(
                    "HTTP {} from {}",
                    status, url
                )));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| RoutingError::Unavailable(format!("failed to read response: {}", e)))
        })
    }
}
