//! Shared outbound HTTP plumbing for the provider adapters.
//!
//! Every request goes through [`OutboundPolicy::run`]: it waits for a token
//! from the per-provider rate limiter, then executes the call, retrying
//! transient failures (429, 5xx, connect and timeout errors) with
//! exponential backoff. Permanent failures and decode errors surface at once.

use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::domain::errors::DomainError;
use crate::domain::models::RetryConfig;

/// Errors raised by the HTTP provider clients
#[derive(Error, Debug)]
pub enum ApiError {
    /// Neither the config nor the environment supplied a key
    #[error("No API key configured")]
    MissingApiKey,

    /// HTTP 401/403
    #[error("Invalid API key - authentication failed")]
    Unauthorized,

    /// HTTP 429
    #[error("Rate limit exceeded - too many requests")]
    RateLimited,

    /// HTTP 5xx
    #[error("Server error ({0}): {1}")]
    Server(StatusCode, String),

    /// Any other non-success status
    #[error("Request rejected ({0}): {1}")]
    Rejected(StatusCode, String),

    /// Transport failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Body did not have the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            s if s.is_server_error() => Self::Server(s, body),
            s => Self::Rejected(s, body),
        }
    }

    /// Returns true if the request may succeed when repeated
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::Server(_, _) => true,
            Self::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// Convert into a domain error tagged with the provider name.
    pub fn into_domain(self, provider: &str) -> DomainError {
        match self {
            Self::Decode(msg) => DomainError::MalformedResponse(format!("{provider}: {msg}")),
            other => DomainError::provider(provider, other.to_string()),
        }
    }
}

/// Build the shared reqwest client.
pub fn build_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .tcp_nodelay(true)
        .build()
        .map_err(ApiError::Network)
}

/// Read a response, mapping non-success statuses to [`ApiError`].
pub async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::from_status(status, body))
    }
}

/// Rate limit plus retry policy for one provider.
pub struct OutboundPolicy {
    limiter: DefaultDirectRateLimiter,
    retry: RetryConfig,
}

impl OutboundPolicy {
    /// Limit to `requests_per_second`; zero is treated as one.
    pub fn new(requests_per_second: u32, retry: RetryConfig) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_second(rps)),
            retry,
        }
    }

    /// Run `op`, rate limited, retrying transient failures up to
    /// `max_retries` times.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.retry.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.retry.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build();
        let max_retries = self.retry.max_retries;
        let mut attempt = 0u32;

        retry(policy, || {
            attempt += 1;
            let attempt = attempt;
            let call = op();
            async move {
                self.limiter.until_ready().await;
                call.await.map_err(|e| {
                    if e.is_transient() && attempt <= max_retries {
                        warn!(attempt, error = %e, "transient provider error, retrying");
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            }
        })
        .await
    }
}
