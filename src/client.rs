//! The async request orchestrator.
//!
//! [`Pdf4meClient::submit`] sends one job and returns its decoded result,
//! whether the service answers synchronously (200) or defers the work and
//! has to be polled (202 + `Location`). The client is cheap to clone; clones
//! share the HTTP connection pool, the waiter and the config.

use crate::config::{ClientConfig, DelayStrategy};
use crate::error::Pdf4meError;
use crate::progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback};
use crate::protocol::decode::{decode, error_message, DecodedResult};
use crate::protocol::delay::{LocalDelayWaiter, RemoteDelayWaiter, Waiter};
use crate::protocol::poll::{PollLoop, PollState};
use crate::protocol::transport::{auth_headers, ContentKind, HttpTransport, JobRequest, Transport};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Client for the PDF4me API.
///
/// # Example
/// ```rust,no_run
/// use pdf4me_word::{ClientConfig, Pdf4meClient};
/// use serde_json::json;
///
/// # async fn run() -> Result<(), pdf4me_word::Pdf4meError> {
/// let client = Pdf4meClient::new(ClientConfig::from_env()?)?;
/// let result = client
///     .submit_auto(
///         "/office/ApiV2Word/ExtractMetadata",
///         json!({ "document": { "name": "a.docx" }, "docContent": "UEsDBA==" }),
///     )
///     .await?;
/// println!("{:?}", result.as_json());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Pdf4meClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    waiter: Arc<dyn Waiter>,
    headers: HeaderMap,
    progress: ProgressCallback,
}

impl std::fmt::Debug for Pdf4meClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pdf4meClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pdf4meClient {
    /// Build a client over a fresh reqwest pool, with the waiter selected by
    /// [`ClientConfig::delay`].
    pub fn new(config: ClientConfig) -> Result<Self, Pdf4meError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::with_timeouts(
            config.connect_timeout(),
            config.submit_timeout(),
        )?);
        let waiter: Arc<dyn Waiter> = match config.delay {
            DelayStrategy::Remote => Arc::new(
                RemoteDelayWaiter::new(transport.clone(), &config.base_url, &config.api_key)
                    .with_timeout(config.poll_timeout()),
            ),
            DelayStrategy::Local(interval) => Arc::new(LocalDelayWaiter::new(interval)),
        };
        Ok(Self::with_transport(config, transport, waiter))
    }

    /// Build a client over caller-supplied transport and waiter.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        waiter: Arc<dyn Waiter>,
    ) -> Self {
        let headers = auth_headers(&config.api_key);
        let progress = config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgressCallback));
        Self {
            config: Arc::new(config),
            transport,
            waiter,
            headers,
            progress,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The transport every call of this client goes through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn progress(&self) -> &dyn JobProgressCallback {
        self.progress.as_ref()
    }

    /// Submit a job and wait for its result.
    ///
    /// `content_kind` decides how the success body is decoded, for the
    /// initial answer and for every poll.
    pub async fn submit(
        &self,
        endpoint_path: &str,
        body: Value,
        content_kind: ContentKind,
    ) -> Result<DecodedResult, Pdf4meError> {
        self.submit_with_cancel(endpoint_path, body, content_kind, &CancellationToken::new())
            .await
    }

    /// Like [`Pdf4meClient::submit`], deriving the content kind from the path.
    pub async fn submit_auto(
        &self,
        endpoint_path: &str,
        body: Value,
    ) -> Result<DecodedResult, Pdf4meError> {
        self.submit(endpoint_path, body, ContentKind::for_endpoint(endpoint_path))
            .await
    }

    /// Submit a job; triggering `cancel` aborts the session at the next
    /// request or wait with [`Pdf4meError::Cancelled`].
    pub async fn submit_with_cancel(
        &self,
        endpoint_path: &str,
        body: Value,
        content_kind: ContentKind,
        cancel: &CancellationToken,
    ) -> Result<DecodedResult, Pdf4meError> {
        let result = self
            .run_job(endpoint_path, body, content_kind, cancel)
            .await;
        if let Err(ref e) = result {
            self.progress.on_job_error(endpoint_path, &e.to_string());
        }
        result
    }

    async fn run_job(
        &self,
        endpoint_path: &str,
        body: Value,
        content_kind: ContentKind,
        cancel: &CancellationToken,
    ) -> Result<DecodedResult, Pdf4meError> {
        let started = Instant::now();
        let request = JobRequest::post(self.config.endpoint_url(endpoint_path), content_kind)
            .headers(self.headers.clone())
            .json_body(body)
            .timeout(self.config.submit_timeout());

        info!("Submitting job to {}", endpoint_path);
        self.progress.on_job_submitted(endpoint_path);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Pdf4meError::Cancelled { attempts: 0 }),
            r = self.transport.send(&request) => r?,
        };
        debug!("{} answered {}", endpoint_path, response.status);

        match response.status {
            200 => {
                let decoded = decode(response.body, content_kind)?;
                info!(
                    "Job {} completed synchronously in {}ms",
                    endpoint_path,
                    started.elapsed().as_millis()
                );
                self.progress.on_job_complete(endpoint_path, 0);
                Ok(decoded)
            }
            202 => {
                let location = response
                    .location()
                    .ok_or(Pdf4meError::MissingPollingLocation)?
                    .to_string();
                info!("Job {} deferred; polling {}", endpoint_path, location);
                self.progress.on_job_deferred(endpoint_path, &location);

                let mut state =
                    PollState::new(location, content_kind, self.config.max_poll_attempts);
                let poll = PollLoop {
                    transport: self.transport.as_ref(),
                    waiter: self.waiter.as_ref(),
                    headers: &self.headers,
                    request_timeout: Some(self.config.poll_timeout()),
                    progress: self.progress.as_ref(),
                    endpoint: endpoint_path,
                };
                let decoded = poll.run(&mut state, cancel).await?;
                info!(
                    "Job {} completed after {} deferred polls in {}ms",
                    endpoint_path,
                    state.attempt_count,
                    started.elapsed().as_millis()
                );
                self.progress
                    .on_job_complete(endpoint_path, state.attempt_count);
                Ok(decoded)
            }
            status => {
                let prefix = format!("API Error: {status}");
                Err(Pdf4meError::RemoteProcessing {
                    status,
                    message: error_message(&prefix, &response.body),
                })
            }
        }
    }
}
