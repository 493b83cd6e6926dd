//! Configuration types for the PDF4me Word client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. One config is shared by every job a client runs,
//! so two clients with equal configs behave identically.

use crate::error::Pdf4meError;
use crate::progress::ProgressCallback;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Production service root.
pub const DEFAULT_BASE_URL: &str = "https://api.pdf4me.com";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "PDF4ME_API_KEY";

/// Environment variable overriding [`DEFAULT_BASE_URL`].
pub const ENV_BASE_URL: &str = "PDF4ME_BASE_URL";

/// Configuration for a [`crate::Pdf4meClient`].
///
/// # Example
/// ```rust
/// use pdf4me_word::{ClientConfig, DelayStrategy};
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .api_key("secret")
///     .max_poll_attempts(120)
///     .delay(DelayStrategy::Local(Duration::from_secs(2)))
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "https://api.pdf4me.com");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Token sent as `Authorization: Basic <api_key>` on every call.
    pub api_key: String,

    /// Service root without trailing slash. Default: `https://api.pdf4me.com`.
    pub base_url: String,

    /// How the poll loop waits between attempts. Default: [`DelayStrategy::Remote`].
    pub delay: DelayStrategy,

    /// Poll attempts before a job is reported as timed out. Default: 9000.
    ///
    /// With the remote delay endpoint each attempt is spaced by the server's
    /// own pause, so the default allows for very long queues.
    pub max_poll_attempts: u32,

    /// Timeout for the initial submit request in seconds. Default: 1000.
    ///
    /// Synchronous answers to large documents can take many minutes.
    pub submit_timeout_secs: u64,

    /// Timeout for each poll request in seconds. Default: 60.
    pub poll_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// TCP connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// Number of operations a batch runs at once. Default: 4.
    pub concurrency: usize,

    /// Optional observer for job lifecycle events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            delay: DelayStrategy::default(),
            max_poll_attempts: 9000,
            submit_timeout_secs: 1000,
            poll_timeout_secs: 60,
            download_timeout_secs: 120,
            connect_timeout_secs: 10,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field(
                "api_key",
                &if self.api_key.is_empty() { "" } else { "<redacted>" },
            )
            .field("base_url", &self.base_url)
            .field("delay", &self.delay)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("submit_timeout_secs", &self.submit_timeout_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn JobProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from `PDF4ME_API_KEY` and, if set, `PDF4ME_BASE_URL`.
    pub fn from_env() -> Result<Self, Pdf4meError> {
        Self::builder_from(|key| std::env::var(key).ok()).build()
    }

    fn builder_from(lookup: impl Fn(&str) -> Option<String>) -> ClientConfigBuilder {
        let mut builder = Self::builder();
        if let Some(key) = lookup(ENV_API_KEY) {
            builder = builder.api_key(key);
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            builder = builder.base_url(url);
        }
        builder
    }

    /// Absolute URL of an endpoint path such as `/office/ApiV2Word/MergeDocuments`.
    pub fn endpoint_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn delay(mut self, delay: DelayStrategy) -> Self {
        self.config.delay = delay;
        self
    }

    pub fn max_poll_attempts(mut self, n: u32) -> Self {
        self.config.max_poll_attempts = n;
        self
    }

    pub fn submit_timeout_secs(mut self, secs: u64) -> Self {
        self.config.submit_timeout_secs = secs;
        self
    }

    pub fn poll_timeout_secs(mut self, secs: u64) -> Self {
        self.config.poll_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, Pdf4meError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(Pdf4meError::InvalidConfig(format!(
                "API key is required (set --api-key or {ENV_API_KEY})"
            )));
        }
        if HeaderValue::from_str(&format!("Basic {}", c.api_key)).is_err() {
            return Err(Pdf4meError::InvalidConfig(
                "API key contains characters not allowed in an HTTP header".into(),
            ));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(Pdf4meError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.max_poll_attempts == 0 {
            return Err(Pdf4meError::InvalidConfig(
                "max_poll_attempts must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(Pdf4meError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.submit_timeout_secs == 0 || c.poll_timeout_secs == 0 {
            return Err(Pdf4meError::InvalidConfig(
                "Request timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the poll loop pauses between attempts.
///
/// | Strategy | Behaviour |
/// |----------|-----------|
/// | `Remote` | GET `<base>/api/v2/AddDelay`; the server decides the pause (default) |
/// | `Local(d)` | `tokio::time::sleep(d)` without touching the network |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DelayStrategy {
    #[default]
    Remote,
    Local(Duration),
}

impl DelayStrategy {
    /// Default pause of the local strategy.
    pub const LOCAL_DEFAULT: Duration = Duration::from_secs(10);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_service_expectations() {
        let c = ClientConfig::default();
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.max_poll_attempts, 9000);
        assert_eq!(c.submit_timeout(), Duration::from_secs(1000));
        assert_eq!(c.delay, DelayStrategy::Remote);
        assert_eq!(c.concurrency, 4);
    }

    #[test]
    fn build_requires_api_key() {
        let err = ClientConfig::builder().build().unwrap_err();
        assert!(matches!(err, Pdf4meError::InvalidConfig(_)));
        assert!(err.to_string().contains(ENV_API_KEY));
    }

    #[test]
    fn build_rejects_key_that_cannot_be_a_header() {
        let err = ClientConfig::builder().api_key("abc\ndef").build().unwrap_err();
        assert!(matches!(err, Pdf4meError::InvalidConfig(_)));
        assert!(err.to_string().contains("HTTP header"), "got: {err}");

        let config = ClientConfig::builder().api_key("abc-def_123").build().unwrap();
        let headers = crate::protocol::transport::auth_headers(&config.api_key);
        assert!(headers.contains_key(reqwest::header::AUTHORIZATION));
    }

    #[test]
    fn build_rejects_bad_base_url_and_zero_attempts() {
        let err = ClientConfig::builder()
            .api_key("k")
            .base_url("ftp://nope")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Base URL"));

        let err = ClientConfig::builder()
            .api_key("k")
            .max_poll_attempts(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_poll_attempts"));
    }

    #[test]
    fn base_url_is_normalised() {
        let c = ClientConfig::builder()
            .api_key("k")
            .base_url(" http://localhost:8080/ ")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "http://localhost:8080");
        assert_eq!(
            c.endpoint_url("/office/ApiV2Word/ReplaceText"),
            "http://localhost:8080/office/ApiV2Word/ReplaceText"
        );
        assert_eq!(
            c.endpoint_url("api/v2/AddDelay"),
            "http://localhost:8080/api/v2/AddDelay"
        );
    }

    #[test]
    fn concurrency_is_clamped_to_one() {
        let c = ClientConfig::builder()
            .api_key("k")
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ClientConfig::builder().api_key("super-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn env_lookup_populates_key_and_url() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "from-env"),
            (ENV_BASE_URL, "https://staging.example.com/"),
        ]
        .into_iter()
        .collect();
        let c = ClientConfig::builder_from(|k| env.get(k).map(|v| v.to_string()))
            .build()
            .unwrap();
        assert_eq!(c.api_key, "from-env");
        assert_eq!(c.base_url, "https://staging.example.com");
    }

    #[test]
    fn env_lookup_without_key_fails() {
        let err = ClientConfig::builder_from(|_| None).build().unwrap_err();
        assert!(matches!(err, Pdf4meError::InvalidConfig(_)));
    }
}
