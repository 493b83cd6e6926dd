//! The poll loop for deferred jobs.
//!
//! ```text
//!            ┌──────────── wait() ◄────────────┐
//!            ▼                                  │
//!   ──► Polling ── GET location ──► 202 / transient failure (attempt += 1)
//!            │                                  │ attempt ≥ max
//!            │                                  ▼
//!            ├─ 200 ──► decode ──► Succeeded    Exhausted (PollingTimedOut)
//!            ├─ 404 ──► NotFound (JobNotFoundOrExpired)
//!            ├─ other ──► Failed (RemoteProcessing)
//!            └─ token ──► Cancelled
//! ```
//!
//! The ceiling is checked before waiting, so a job allowed `N` attempts makes
//! `N` poll requests separated by `N - 1` waits.

use crate::error::Pdf4meError;
use crate::progress::JobProgressCallback;
use crate::protocol::decode::{decode, error_message, DecodedResult};
use crate::protocol::delay::Waiter;
use crate::protocol::transport::{ContentKind, JobRequest, Transport};
use reqwest::header::HeaderMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Mutable progress of one deferred job. In-memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub location_url: String,
    pub content_kind: ContentKind,
    pub attempt_count: u32,
    pub max_attempts: u32,
}

impl PollState {
    pub fn new(location_url: impl Into<String>, content_kind: ContentKind, max_attempts: u32) -> Self {
        Self {
            location_url: location_url.into(),
            content_kind,
            attempt_count: 0,
            max_attempts,
        }
    }

    fn exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }
}

/// Everything a poll session borrows from its client.
pub struct PollLoop<'a> {
    pub transport: &'a dyn Transport,
    pub waiter: &'a dyn Waiter,
    pub headers: &'a HeaderMap,
    pub request_timeout: Option<Duration>,
    pub progress: &'a dyn JobProgressCallback,
    /// Endpoint of the originating job, for progress events and logs.
    pub endpoint: &'a str,
}

impl PollLoop<'_> {
    /// Drive `state` to a terminal outcome.
    pub async fn run(
        &self,
        state: &mut PollState,
        cancel: &CancellationToken,
    ) -> Result<DecodedResult, Pdf4meError> {
        let mut request = JobRequest::get(state.location_url.clone(), state.content_kind)
            .headers(self.headers.clone());
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        loop {
            if cancel.is_cancelled() {
                return Err(Pdf4meError::Cancelled {
                    attempts: state.attempt_count,
                });
            }

            debug!(
                "Polling {} (attempt {}/{})",
                state.location_url,
                state.attempt_count + 1,
                state.max_attempts
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(Pdf4meError::Cancelled { attempts: state.attempt_count });
                }
                r = self.transport.send(&request) => r,
            };

            match outcome {
                Ok(resp) => match resp.status {
                    200 => return decode(resp.body, state.content_kind),
                    202 => {
                        state.attempt_count += 1;
                        self.progress.on_poll_attempt(
                            self.endpoint,
                            state.attempt_count,
                            state.max_attempts,
                        );
                        if state.exhausted() {
                            return Err(Pdf4meError::PollingTimedOut {
                                attempts: state.attempt_count,
                                last_transport_error: None,
                            });
                        }
                    }
                    404 => return Err(Pdf4meError::JobNotFoundOrExpired),
                    status => {
                        let prefix = format!("Polling failed with status {status}");
                        return Err(Pdf4meError::RemoteProcessing {
                            status,
                            message: error_message(&prefix, &resp.body),
                        });
                    }
                },
                Err(failure) if failure.is_transient() => {
                    state.attempt_count += 1;
                    warn!(
                        "Transient network error while polling {} (attempt {}/{}): {}",
                        self.endpoint, state.attempt_count, state.max_attempts, failure
                    );
                    self.progress.on_poll_attempt(
                        self.endpoint,
                        state.attempt_count,
                        state.max_attempts,
                    );
                    if state.exhausted() {
                        return Err(Pdf4meError::PollingTimedOut {
                            attempts: state.attempt_count,
                            last_transport_error: Some(failure.message),
                        });
                    }
                }
                Err(failure) => return Err(Pdf4meError::Transport(failure)),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(Pdf4meError::Cancelled { attempts: state.attempt_count });
                }
                _ = self.waiter.wait() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportFailure;
    use crate::progress::NoopProgressCallback;
    use crate::protocol::transport::{JobResponse, ResponseBody};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted outcomes; repeats the last one when the script runs out.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<(u16, ResponseBody), TransportFailure>>>,
        last: Mutex<Option<Result<(u16, ResponseBody), TransportFailure>>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<(u16, ResponseBody), TransportFailure>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _request: &JobRequest) -> Result<JobResponse, TransportFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            let step = match next {
                Some(step) => {
                    *self.last.lock().unwrap() = Some(step.clone());
                    step
                }
                None => self.last.lock().unwrap().clone().expect("empty script"),
            };
            step.map(|(status, body)| JobResponse {
                status,
                headers: HeaderMap::new(),
                body,
            })
        }
    }

    #[derive(Default)]
    struct CountingWaiter {
        waits: AtomicU32,
    }

    #[async_trait]
    impl Waiter for CountingWaiter {
        async fn wait(&self) {
            self.waits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn still_running() -> Result<(u16, ResponseBody), TransportFailure> {
        Ok((202, ResponseBody::Bytes(vec![])))
    }

    async fn run(
        transport: &ScriptedTransport,
        waiter: &dyn Waiter,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> (Result<DecodedResult, Pdf4meError>, PollState) {
        let headers = HeaderMap::new();
        let poll = PollLoop {
            transport,
            waiter,
            headers: &headers,
            request_timeout: None,
            progress: &NoopProgressCallback,
            endpoint: "/api/v2/Test",
        };
        let mut state = PollState::new("https://x/poll/1", ContentKind::Binary, max_attempts);
        let result = poll.run(&mut state, cancel).await;
        (result, state)
    }

    #[tokio::test]
    async fn always_deferred_times_out_after_max_attempts() {
        let transport = ScriptedTransport::new(vec![still_running()]);
        let waiter = CountingWaiter::default();
        let (result, state) = run(&transport, &waiter, 3, &CancellationToken::new()).await;

        match result.unwrap_err() {
            Pdf4meError::PollingTimedOut { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected PollingTimedOut, got {other:?}"),
        }
        assert_eq!(transport.calls(), 3);
        assert_eq!(waiter.waits.load(Ordering::SeqCst), 2);
        assert_eq!(state.attempt_count, 3);
    }

    #[tokio::test]
    async fn one_deferral_then_success() {
        let transport = ScriptedTransport::new(vec![
            still_running(),
            Ok((200, ResponseBody::Bytes(b"PK\x03\x04".to_vec()))),
        ]);
        let waiter = CountingWaiter::default();
        let (result, state) = run(&transport, &waiter, 10, &CancellationToken::new()).await;

        assert_eq!(result.unwrap(), DecodedResult::Binary(b"PK\x03\x04".to_vec()));
        assert_eq!(state.attempt_count, 1);
        assert_eq!(waiter.waits.load(Ordering::SeqCst), 1);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn not_found_stops_after_one_poll() {
        let transport = ScriptedTransport::new(vec![Ok((404, ResponseBody::Bytes(vec![])))]);
        let waiter = CountingWaiter::default();
        let (result, _) = run(&transport, &waiter, 10, &CancellationToken::new()).await;

        assert!(matches!(result, Err(Pdf4meError::JobNotFoundOrExpired)));
        assert_eq!(transport.calls(), 1);
        assert_eq!(waiter.waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn other_status_surfaces_service_message() {
        let transport = ScriptedTransport::new(vec![Ok((
            500,
            ResponseBody::Bytes(br#"{"error":"conversion engine crashed"}"#.to_vec()),
        ))]);
        let (result, _) = run(
            &transport,
            &CountingWaiter::default(),
            10,
            &CancellationToken::new(),
        )
        .await;

        match result.unwrap_err() {
            Pdf4meError::RemoteProcessing { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "conversion engine crashed");
            }
            other => panic!("expected RemoteProcessing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportFailure::from_message("read ECONNRESET")),
            Ok((200, ResponseBody::Bytes(vec![7]))),
        ]);
        let waiter = CountingWaiter::default();
        let (result, state) = run(&transport, &waiter, 10, &CancellationToken::new()).await;

        assert_eq!(result.unwrap(), DecodedResult::Binary(vec![7]));
        assert_eq!(state.attempt_count, 1);
        assert_eq!(waiter.waits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failure_at_ceiling_reports_network_error() {
        let transport = ScriptedTransport::new(vec![Err(TransportFailure::from_message(
            "getaddrinfo ENOTFOUND api.pdf4me.com",
        ))]);
        let (result, _) = run(
            &transport,
            &CountingWaiter::default(),
            2,
            &CancellationToken::new(),
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, Pdf4meError::PollingTimedOut { attempts: 2, .. }));
        assert!(err.to_string().contains("ENOTFOUND"));
    }

    #[tokio::test]
    async fn fatal_transport_failure_is_not_retried() {
        let transport =
            ScriptedTransport::new(vec![Err(TransportFailure::from_message("invalid certificate"))]);
        let waiter = CountingWaiter::default();
        let (result, _) = run(&transport, &waiter, 10, &CancellationToken::new()).await;

        assert!(matches!(result, Err(Pdf4meError::Transport(_))));
        assert_eq!(transport.calls(), 1);
        assert_eq!(waiter.waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_polling() {
        let transport = ScriptedTransport::new(vec![still_running()]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (result, _) = run(&transport, &CountingWaiter::default(), 10, &cancel).await;

        assert!(matches!(result, Err(Pdf4meError::Cancelled { attempts: 0 })));
        assert_eq!(transport.calls(), 0);
    }

    struct CancellingWaiter {
        token: CancellationToken,
    }

    #[async_trait]
    impl Waiter for CancellingWaiter {
        async fn wait(&self) {
            self.token.cancel();
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_pending_wait() {
        let transport = ScriptedTransport::new(vec![still_running()]);
        let cancel = CancellationToken::new();
        let waiter = CancellingWaiter {
            token: cancel.clone(),
        };
        let (result, _) = run(&transport, &waiter, 10, &cancel).await;

        assert!(matches!(result, Err(Pdf4meError::Cancelled { attempts: 1 })));
        assert_eq!(transport.calls(), 1);
    }
}
