//! The pause between two poll attempts.
//!
//! The poll loop only knows it must call [`Waiter::wait`] once per deferred
//! attempt. Whether that pause is a server-side delay call or a local timer is
//! the waiter's business; tests inject a counting waiter that returns
//! immediately.

use crate::protocol::transport::{auth_headers, ContentKind, JobRequest, Transport};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Path of the service's delay endpoint.
pub const DELAY_ENDPOINT: &str = "/api/v2/AddDelay";

/// Suspends the calling job for one polling interval.
///
/// Must never fail the job: any error while waiting is swallowed.
#[async_trait]
pub trait Waiter: Send + Sync {
    async fn wait(&self);
}

/// Pauses by calling the service's `AddDelay` endpoint, which holds the
/// connection open for the server-chosen interval.
pub struct RemoteDelayWaiter {
    transport: Arc<dyn Transport>,
    request: JobRequest,
}

impl RemoteDelayWaiter {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str, api_key: &str) -> Self {
        let request = JobRequest::get(format!("{base_url}{DELAY_ENDPOINT}"), ContentKind::Binary)
            .headers(auth_headers(api_key));
        Self { transport, request }
    }

    /// Override the per-call timeout of the delay request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request = self.request.timeout(timeout);
        self
    }
}

#[async_trait]
impl Waiter for RemoteDelayWaiter {
    async fn wait(&self) {
        match self.transport.send(&self.request).await {
            Ok(resp) => debug!("Delay endpoint answered {}", resp.status),
            Err(e) => debug!("Delay call failed (ignored): {}", e),
        }
    }
}

/// Pauses with a local timer; no network traffic.
#[derive(Debug, Clone, Copy)]
pub struct LocalDelayWaiter {
    interval: Duration,
}

impl LocalDelayWaiter {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for LocalDelayWaiter {
    fn default() -> Self {
        Self::new(crate::config::DelayStrategy::LOCAL_DEFAULT)
    }
}

#[async_trait]
impl Waiter for LocalDelayWaiter {
    async fn wait(&self) {
        tokio::time::sleep(self.interval).await;
    }
}
