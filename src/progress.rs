//! Progress-callback trait for job lifecycle events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to observe each
//! submit, deferral, poll attempt and outcome as it happens.
//!
//! A job on the remote service can sit in the queue for minutes, so the
//! interesting signal for a UI is the poll counter. Callbacks are invoked
//! inline from the polling task; keep them cheap.
//!
//! # Example
//!
//! ```rust
//! use pdf4me_word::{ClientConfig, JobProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct PollCounter {
//!     polls: AtomicU32,
//! }
//!
//! impl JobProgressCallback for PollCounter {
//!     fn on_poll_attempt(&self, _endpoint: &str, attempt: u32, max_attempts: u32) {
//!         self.polls.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("still processing ({attempt}/{max_attempts})");
//!     }
//! }
//!
//! let counter = Arc::new(PollCounter { polls: AtomicU32::new(0) });
//!
//! let config = ClientConfig::builder()
//!     .api_key("secret")
//!     .progress_callback(counter as Arc<dyn JobProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the client as a job moves through submit and poll.
///
/// Implementations must be `Send + Sync`: batch runs drive several jobs at
/// once, so every method may be called concurrently for different endpoints.
/// All methods default to no-ops.
pub trait JobProgressCallback: Send + Sync {
    /// Called once before a batch of operations starts.
    fn on_batch_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called right before the initial request of a job is sent.
    fn on_job_submitted(&self, endpoint: &str) {
        let _ = endpoint;
    }

    /// Called when the service defers a job (202) and hands out a poll URL.
    fn on_job_deferred(&self, endpoint: &str, location: &str) {
        let _ = (endpoint, location);
    }

    /// Called after each poll that found the job still running.
    ///
    /// # Arguments
    /// * `attempt`: 1-indexed attempt counter
    /// * `max_attempts`: the ceiling after which the job times out
    fn on_poll_attempt(&self, endpoint: &str, attempt: u32, max_attempts: u32) {
        let _ = (endpoint, attempt, max_attempts);
    }

    /// Called when a job produced its result. `attempts` is 0 for a
    /// synchronous (200) answer.
    fn on_job_complete(&self, endpoint: &str, attempts: u32) {
        let _ = (endpoint, attempts);
    }

    /// Called when a job fails for any reason.
    fn on_job_error(&self, endpoint: &str, error: &str) {
        let _ = (endpoint, error);
    }

    /// Called once after every item of a batch has been attempted.
    fn on_batch_complete(&self, total_items: usize, success_count: usize) {
        let _ = (total_items, success_count);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn JobProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        submitted: AtomicU32,
        polls: AtomicU32,
        errors: Mutex<Vec<String>>,
        last_location: Mutex<Option<String>>,
    }

    impl JobProgressCallback for TrackingCallback {
        fn on_job_submitted(&self, _endpoint: &str) {
            self.submitted.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_deferred(&self, _endpoint: &str, location: &str) {
            *self.last_location.lock().unwrap() = Some(location.to_string());
        }

        fn on_poll_attempt(&self, _endpoint: &str, _attempt: u32, _max: u32) {
            self.polls.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_error(&self, _endpoint: &str, error: &str) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_job_submitted("/office/ApiV2Word/ReplaceText");
        cb.on_job_deferred("/office/ApiV2Word/ReplaceText", "https://x/poll");
        cb.on_poll_attempt("/office/ApiV2Word/ReplaceText", 1, 9000);
        cb.on_job_complete("/office/ApiV2Word/ReplaceText", 1);
        cb.on_job_error("/office/ApiV2Word/ReplaceText", "boom");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_job_submitted("/a");
        tracker.on_job_deferred("/a", "https://api/poll/42");
        tracker.on_poll_attempt("/a", 1, 3);
        tracker.on_poll_attempt("/a", 2, 3);
        tracker.on_job_error("/a", "timed out");

        assert_eq!(tracker.submitted.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.polls.load(Ordering::SeqCst), 2);
        assert_eq!(
            tracker.last_location.lock().unwrap().as_deref(),
            Some("https://api/poll/42")
        );
        assert_eq!(tracker.errors.lock().unwrap().as_slice(), ["timed out"]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_job_submitted("/x");
        cb.on_job_complete("/x", 0);
    }
}
