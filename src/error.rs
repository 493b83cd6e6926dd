//! Error types for the pdf4me-word library.
//!
//! Every failure path in the crate produces exactly one [`Pdf4meError`]. The
//! submit/poll core never swallows an error; the operation layer wraps core
//! failures in [`Pdf4meError::OperationFailed`] so the end user sees which
//! Word action failed ("Add text watermark to Word failed: quota exceeded").
//!
//! Transport-level failures are modelled separately as [`TransportFailure`]
//! because the poll loop needs to classify them (transient vs fatal) before
//! deciding whether they become an error at all.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf4me-word library.
#[derive(Debug, Error)]
pub enum Pdf4meError {
    // ── Protocol errors ───────────────────────────────────────────────────
    /// No HTTP response could be obtained (DNS, connection reset, timeout).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportFailure),

    /// The service deferred the job (202) without a usable `Location` header.
    #[error("No polling URL found in response (202 without Location header)")]
    MissingPollingLocation,

    /// A poll returned 404.
    #[error("Processing job not found or expired. The document processing may have timed out.")]
    JobNotFoundOrExpired,

    /// Non-success status from the service. The message is shown verbatim.
    #[error("{message}")]
    RemoteProcessing { status: u16, message: String },

    /// A string body too short to be a document arrived where bytes were expected.
    #[error("API returned error message: {body}")]
    UnexpectedShortResponse { body: String },

    /// A string body arrived where bytes were expected and was not valid base64.
    #[error("API returned unexpected string response: {preview}...")]
    UndecodableResponse { preview: String },

    /// A JSON endpoint answered with something that is not a JSON object.
    #[error("API returned unexpected response shape: {detail}")]
    UnexpectedResponseShape { detail: String },

    /// The job was still running when the attempt ceiling was reached.
    #[error(
        "Document processing timed out after {attempts} polling attempts. \
The operation may still be processing on the server.{}",
        network_suffix(.last_transport_error)
    )]
    PollingTimedOut {
        attempts: u32,
        last_transport_error: Option<String>,
    },

    /// The caller cancelled the job while it was being polled.
    #[error("Job cancelled after {attempts} polling attempts")]
    Cancelled { attempts: u32 },

    /// The result decoded fine but is not a usable Word document.
    #[error("{reason}")]
    MalformedArtifact { reason: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Word file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Downloading an input document failed.
    #[error("Failed to download file from URL '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// Inline base64 content could not be decoded.
    #[error("Invalid base64 content for '{file_name}': {detail}")]
    InvalidBase64 { file_name: String, detail: String },

    /// The resolved document has no content.
    #[error("Word content is required ('{file_name}' is empty)")]
    EmptyDocument { file_name: String },

    // ── Caller errors ─────────────────────────────────────────────────────
    /// Operation parameters are inconsistent (e.g. merge with one document).
    #[error("{0}")]
    InvalidOperation(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A Word action failed; `source` carries the underlying cause.
    #[error("{action} failed: {source}")]
    OperationFailed {
        action: String,
        #[source]
        source: Box<Pdf4meError>,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf4meError {
    /// Wrap `self` with the name of the Word action that produced it.
    pub fn in_action(self, action: impl Into<String>) -> Self {
        Pdf4meError::OperationFailed {
            action: action.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, looking through [`Pdf4meError::OperationFailed`].
    pub fn root(&self) -> &Pdf4meError {
        match self {
            Pdf4meError::OperationFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Category of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TransportFailureKind {
    /// Host name could not be resolved (`ENOTFOUND`).
    Dns,
    /// Connection reset or closed by the peer mid-request (`ECONNRESET`).
    ConnectionReset,
    /// The request or connect phase timed out.
    Timeout,
    /// Anything else (TLS, malformed URL, body read error, ...).
    Other,
}

/// A failure that prevented obtaining any HTTP response at all.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportFailure {
    pub kind: TransportFailureKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build a failure from a bare message, classifying it by known markers.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify_message(&message),
            message,
        }
    }

    /// Whether the poll loop may retry after this failure.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            TransportFailureKind::Dns
                | TransportFailureKind::ConnectionReset
                | TransportFailureKind::Timeout
        )
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(e: reqwest::Error) -> Self {
        let message = error_chain_message(&e);
        // Connect errors cover refused ports and TLS failures too; only the
        // cause text tells a reset apart from those.
        let kind = if e.is_timeout() {
            TransportFailureKind::Timeout
        } else {
            classify_message(&message)
        };
        Self { kind, message }
    }
}

/// Classify a transport error message by the markers the remote stack emits.
///
/// Matching is case-insensitive; DNS is checked first because resolver
/// messages often also mention the connection.
pub fn classify_message(message: &str) -> TransportFailureKind {
    let lower = message.to_lowercase();
    const DNS: &[&str] = &[
        "enotfound",
        "dns error",
        "failed to lookup address",
        "name or service not known",
        "no such host",
    ];
    const RESET: &[&str] = &[
        "econnreset",
        "connection reset",
        "connection closed",
    ];

    if DNS.iter().any(|m| lower.contains(m)) {
        TransportFailureKind::Dns
    } else if RESET.iter().any(|m| lower.contains(m)) {
        TransportFailureKind::ConnectionReset
    } else if lower.contains("timeout") || lower.contains("timed out") {
        TransportFailureKind::Timeout
    } else {
        TransportFailureKind::Other
    }
}

fn network_suffix(last: &Option<String>) -> String {
    last.as_ref()
        .map(|e| format!(" Last network error: {e}"))
        .unwrap_or_default()
}

// reqwest's Display hides the hyper/io cause that carries the useful marker.
fn error_chain_message(e: &(dyn std::error::Error + 'static)) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_processing_display_is_verbatim() {
        let e = Pdf4meError::RemoteProcessing {
            status: 429,
            message: "quota exceeded".into(),
        };
        assert_eq!(e.to_string(), "quota exceeded");
    }

    #[test]
    fn polling_timed_out_mentions_attempts() {
        let e = Pdf4meError::PollingTimedOut {
            attempts: 3,
            last_transport_error: None,
        };
        assert!(e.to_string().contains("after 3 polling attempts"), "got: {e}");

        let e = Pdf4meError::PollingTimedOut {
            attempts: 2,
            last_transport_error: Some("ECONNRESET".into()),
        };
        assert!(e.to_string().contains("Last network error: ECONNRESET"));
    }

    #[test]
    fn operation_failed_prefixes_action() {
        let e = Pdf4meError::JobNotFoundOrExpired.in_action("Add text watermark to Word");
        assert!(e
            .to_string()
            .starts_with("Add text watermark to Word failed: Processing job not found"));
        assert!(matches!(e.root(), Pdf4meError::JobNotFoundOrExpired));
    }

    #[test]
    fn classify_known_markers() {
        assert_eq!(
            classify_message("getaddrinfo ENOTFOUND api.pdf4me.com"),
            TransportFailureKind::Dns
        );
        assert_eq!(
            classify_message("dns error: failed to lookup address information"),
            TransportFailureKind::Dns
        );
        assert_eq!(
            classify_message("read ECONNRESET"),
            TransportFailureKind::ConnectionReset
        );
        assert_eq!(
            classify_message("operation timed out"),
            TransportFailureKind::Timeout
        );
        assert_eq!(
            classify_message("invalid certificate"),
            TransportFailureKind::Other
        );
    }

    #[test]
    fn transient_kinds() {
        assert!(TransportFailure::from_message("ECONNRESET").is_transient());
        assert!(TransportFailure::from_message("request timeout").is_transient());
        assert!(!TransportFailure::from_message("bad TLS handshake").is_transient());
    }

    #[test]
    fn refused_connections_are_fatal() {
        assert_eq!(
            classify_message("connect ECONNREFUSED 127.0.0.1:1"),
            TransportFailureKind::Other
        );
        assert_eq!(
            classify_message("tcp connect error: Connection refused (os error 111)"),
            TransportFailureKind::Other
        );
        assert_eq!(
            classify_message("connection closed before message completed"),
            TransportFailureKind::ConnectionReset
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pdf4meError>();
    }
}
