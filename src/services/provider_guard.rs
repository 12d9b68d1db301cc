//! Time budget for external provider calls.

use std::future::Future;
use tokio::time::{timeout, Duration};

use crate::domain::errors::{DomainError, DomainResult};

/// Run a provider call under `limit`. Expiry is reported as a failure of
/// `provider`, the same as any other provider error.
pub async fn with_timeout<T, F>(provider: &str, limit: Duration, call: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::provider(
            provider,
            format!("timed out after {}ms", limit.as_millis()),
        )),
    }
}
