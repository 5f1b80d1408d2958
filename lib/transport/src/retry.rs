//! Optional retry of transient transport failures.
//!
//! Only failures where no response arrived (connection reset, request timeout)
//! are retried. A response with an error status is never retried here: the
//! cluster answered, and resubmitting a mutating call could duplicate work.

use crate::error::TransportError;
use crate::port::{Request, Response, TransportPort};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a retry policy.
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Returns true if retrying is turned off.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.max_retries == 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Wraps a transport and retries transient failures.
#[derive(Debug, Clone)]
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: TransportPort> RetryingTransport<T> {
    /// Wraps `inner` with the given policy.
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: TransportPort> TransportPort for RetryingTransport<T> {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let mut attempt = 0;
        loop {
            match self.inner.send(request.clone()).await {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    warn!(
                        error = %e,
                        attempt,
                        max_retries = self.policy.max_retries,
                        method = %request.method,
                        path = %request.path,
                        "transient transport failure, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
                other => return other,
            }
        }
    }
}
