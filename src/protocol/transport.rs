//! Transport invoker: one authenticated HTTP call, reported as received.
//!
//! The submit/poll core never wants reqwest's opinion about status codes:
//! a 202 or a 404 is a protocol signal, not an error. [`Transport::send`]
//! therefore returns every response it manages to obtain and only fails when
//! no response exists at all (DNS, reset connection, timeout).
//!
//! The trait exists so the poll loop can be exercised against scripted
//! responses without a network; [`HttpTransport`] is the production
//! implementation over a shared `reqwest::Client`.

use crate::error::TransportFailure;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::Method;
use std::time::Duration;
use tracing::debug;

/// How a given endpoint's payloads are interpreted.
///
/// Decided once per job, from the endpoint path, and honoured for the
/// initial request and every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ContentKind {
    /// Structured JSON (the `/ApiV2Word/` namespace).
    Json,
    /// Raw file bytes.
    Binary,
}

impl ContentKind {
    /// Word endpoints return JSON with the document embedded; everything
    /// else on the service streams the file itself.
    pub fn for_endpoint(path: &str) -> Self {
        if path.contains("/ApiV2Word/") {
            ContentKind::Json
        } else {
            ContentKind::Binary
        }
    }
}

/// A single HTTP call, built once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    pub query: Vec<(String, String)>,
    pub content_kind: ContentKind,
    pub timeout: Option<Duration>,
}

impl JobRequest {
    pub fn new(method: Method, url: impl Into<String>, content_kind: ContentKind) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            query: Vec::new(),
            content_kind,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>, content_kind: ContentKind) -> Self {
        Self::new(Method::GET, url, content_kind)
    }

    pub fn post(url: impl Into<String>, content_kind: ContentKind) -> Self {
        Self::new(Method::POST, url, content_kind)
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attach a JSON body. Empty objects are dropped, as the service
    /// rejects `{}` on endpoints that take no body.
    pub fn json_body(mut self, body: serde_json::Value) -> Self {
        let empty = matches!(&body, serde_json::Value::Object(m) if m.is_empty())
            || body.is_null();
        self.body = if empty { None } else { Some(body) };
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Body of a response, tagged by how it actually arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Raw bytes (binary transfer mode).
    Bytes(Vec<u8>),
    /// Text that was not parseable as JSON, or a string-encoded payload.
    Text(String),
    /// Parsed JSON (JSON transfer mode).
    Json(serde_json::Value),
}

impl ResponseBody {
    /// Best-effort text rendering for diagnostics.
    pub fn to_text(&self) -> String {
        match self {
            ResponseBody::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            ResponseBody::Text(s) => s.clone(),
            ResponseBody::Json(v) => v.to_string(),
        }
    }
}

/// A response exactly as received. Header lookup is case-insensitive.
#[derive(Debug, Clone)]
pub struct JobResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl JobResponse {
    /// The `Location` header, if present, non-empty and valid UTF-8.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Performs one HTTP call.
///
/// Implementations must not fail on any HTTP status; only on the absence of
/// a response. Calls may complete in any order relative to each other.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &JobRequest) -> Result<JobResponse, TransportFailure>;
}

/// Build the headers the service expects on every call, polls and delay
/// calls included.
///
/// `ClientConfigBuilder::build` rejects keys that are not valid header
/// values, so a built config always yields an `Authorization` header.
pub fn auth_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(&format!("Basic {api_key}")) {
        headers.insert(AUTHORIZATION, v);
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Production transport over a shared reqwest client.
///
/// Connection pooling is left to reqwest: clones of the same `HttpTransport`
/// share one pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client with the given connect timeout and per-request default.
    pub fn with_timeouts(
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, TransportFailure> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &JobRequest) -> Result<JobResponse, TransportFailure> {
        debug!("HTTP {} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let body = match request.content_kind {
            ContentKind::Binary => ResponseBody::Bytes(bytes.to_vec()),
            ContentKind::Json => match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(value) => ResponseBody::Json(value),
                Err(_) => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
            },
        };

        debug!("HTTP {} {} → {}", request.method, request.url, status);
        Ok(JobResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderName;

    #[test]
    fn content_kind_from_path() {
        assert_eq!(
            ContentKind::for_endpoint("/office/ApiV2Word/WordAddTextWatermark"),
            ContentKind::Json
        );
        assert_eq!(
            ContentKind::for_endpoint("/api/v2/ConvertToPdf"),
            ContentKind::Binary
        );
    }

    #[test]
    fn location_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("location"),
            HeaderValue::from_static("https://example.com/poll/1"),
        );
        let resp = JobResponse {
            status: 202,
            headers,
            body: ResponseBody::Text(String::new()),
        };
        assert_eq!(resp.location(), Some("https://example.com/poll/1"));
    }

    #[test]
    fn blank_location_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("  "));
        let resp = JobResponse {
            status: 202,
            headers,
            body: ResponseBody::Bytes(vec![]),
        };
        assert_eq!(resp.location(), None);
    }

    #[test]
    fn empty_json_body_is_dropped() {
        let req = JobRequest::post("https://x", ContentKind::Json).json_body(serde_json::json!({}));
        assert!(req.body.is_none());
        let req = JobRequest::post("https://x", ContentKind::Json)
            .json_body(serde_json::json!({ "a": 1 }));
        assert!(req.body.is_some());
    }

    #[test]
    fn auth_headers_carry_basic_key() {
        let h = auth_headers("secret");
        assert_eq!(h.get(AUTHORIZATION).unwrap(), "Basic secret");
        assert_eq!(h.get("content-type").unwrap(), "application/json");
    }
}
