//! Input resolution: turn a caller-supplied document into base64 content plus
//! the file name the service should see.
//!
//! Four sources are accepted. Bytes already in memory are encoded; inline
//! base64 is used as-is once any data-URL prefix is stripped; URLs are
//! downloaded through the client's transport; local paths are read from disk.

use crate::client::Pdf4meClient;
use crate::error::{Pdf4meError, TransportFailureKind};
use crate::protocol::decode::decode_base64;
use crate::protocol::transport::{ContentKind, JobRequest, ResponseBody};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a document comes from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// Raw file bytes, with the name they were attached under, if any.
    Binary {
        bytes: Vec<u8>,
        file_name: Option<String>,
    },
    /// Inline base64, optionally as a `data:...;base64,` URL.
    Base64 {
        content: String,
        file_name: Option<String>,
    },
    /// A downloadable http(s) URL.
    Url(String),
    /// A local file.
    File(PathBuf),
}

impl DocumentSource {
    /// Interpret a CLI argument: http(s) URLs are downloaded, anything else
    /// is a path.
    pub fn from_arg(arg: &str) -> Self {
        if is_url(arg) {
            DocumentSource::Url(arg.to_string())
        } else {
            DocumentSource::File(PathBuf::from(arg))
        }
    }

    pub fn base64(content: impl Into<String>) -> Self {
        DocumentSource::Base64 {
            content: content.into(),
            file_name: None,
        }
    }

    pub fn bytes(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        DocumentSource::Binary {
            bytes,
            file_name: Some(file_name.into()),
        }
    }
}

/// A document ready to be embedded in a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    pub content_base64: String,
    pub file_name: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `source`, falling back to `default_name` when the source carries
/// no file name of its own.
pub async fn resolve_document(
    client: &Pdf4meClient,
    source: &DocumentSource,
    default_name: &str,
) -> Result<ResolvedDocument, Pdf4meError> {
    let resolved = match source {
        DocumentSource::Binary { bytes, file_name } => ResolvedDocument {
            content_base64: STANDARD.encode(bytes),
            file_name: non_empty_or(file_name.as_deref(), default_name),
        },
        DocumentSource::Base64 { content, file_name } => {
            let file_name = non_empty_or(file_name.as_deref(), default_name);
            let content = strip_data_url_prefix(content).trim().to_string();
            if !content.is_empty() {
                decode_base64(&content).map_err(|e| Pdf4meError::InvalidBase64 {
                    file_name: file_name.clone(),
                    detail: e.to_string(),
                })?;
            }
            ResolvedDocument {
                content_base64: content,
                file_name,
            }
        }
        DocumentSource::Url(url) => download_url(client, url, default_name).await?,
        DocumentSource::File(path) => read_local(path).await?,
    };

    if resolved.content_base64.trim().is_empty() {
        return Err(Pdf4meError::EmptyDocument {
            file_name: resolved.file_name,
        });
    }
    Ok(resolved)
}

/// Drop a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url_prefix(content: &str) -> &str {
    match content.split_once(',') {
        Some((_, rest)) => rest,
        None => content,
    }
}

async fn read_local(path: &Path) -> Result<ResolvedDocument, Pdf4meError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf4meError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf4meError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.docx".to_string());
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(ResolvedDocument {
        content_base64: STANDARD.encode(&bytes),
        file_name,
    })
}

async fn download_url(
    client: &Pdf4meClient,
    url: &str,
    default_name: &str,
) -> Result<ResolvedDocument, Pdf4meError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Pdf4meError::InvalidOperation(
            "URL is required when using URL input type".into(),
        ));
    }
    info!("Downloading document from: {}", url);

    let timeout = client.config().download_timeout();
    let request = JobRequest::get(url, ContentKind::Binary).timeout(timeout);
    let response = client.transport().send(&request).await.map_err(|e| {
        if e.kind == TransportFailureKind::Timeout {
            Pdf4meError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout.as_secs(),
            }
        } else {
            Pdf4meError::DownloadFailed {
                url: url.to_string(),
                reason: e.message,
            }
        }
    })?;

    if !(200..300).contains(&response.status) {
        return Err(Pdf4meError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status),
        });
    }

    let file_name = response
        .headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_content_disposition)
        .or_else(|| filename_from_url(url))
        .unwrap_or_else(|| default_name.to_string());

    let bytes = match response.body {
        ResponseBody::Bytes(b) => b,
        other => other.to_text().into_bytes(),
    };
    info!("Downloaded {} bytes as '{}'", bytes.len(), file_name);

    Ok(ResolvedDocument {
        content_base64: STANDARD.encode(&bytes),
        file_name,
    })
}

static RE_DISPOSITION_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"filename[^;=\n]*=("[^"]*"|'[^']*'|[^;\n]*)"#).unwrap());

/// `attachment; filename="report.docx"` → `report.docx`.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let raw = RE_DISPOSITION_FILENAME.captures(header)?.get(1)?.as_str();
    let name: String = raw.chars().filter(|c| *c != '"' && *c != '\'').collect();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Last path segment of `url`, query and fragment dropped, percent-decoded.
pub fn filename_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let without_scheme = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    let (_host, path) = without_scheme.split_once('/')?;
    let last = path.rsplit('/').next()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| last.to_string());
    (!decoded.is_empty()).then_some(decoded)
}

fn non_empty_or(name: Option<&str>, default_name: &str) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(default_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.docx"));
        assert!(is_url("http://example.com/doc.docx"));
        assert!(!is_url("/tmp/doc.docx"));
        assert!(!is_url("doc.docx"));
        assert!(!is_url(""));
    }

    #[test]
    fn from_arg_picks_source() {
        assert!(matches!(
            DocumentSource::from_arg("https://x/a.docx"),
            DocumentSource::Url(_)
        ));
        assert!(matches!(
            DocumentSource::from_arg("./a.docx"),
            DocumentSource::File(_)
        ));
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        assert_eq!(
            strip_data_url_prefix(
                "data:application/vnd.openxmlformats-officedocument.wordprocessingml.document;base64,UEsDBA=="
            ),
            "UEsDBA=="
        );
        assert_eq!(strip_data_url_prefix("UEsDBA=="), "UEsDBA==");
    }

    #[test]
    fn content_disposition_variants() {
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="report.docx""#).as_deref(),
            Some("report.docx")
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename=plain.docx; size=10").as_deref(),
            Some("plain.docx")
        );
        assert_eq!(filename_from_content_disposition("inline"), None);
    }

    #[test]
    fn url_filename_is_decoded_without_query() {
        assert_eq!(
            filename_from_url("https://files.example.com/a/My%20Report.docx?sig=abc").as_deref(),
            Some("My Report.docx")
        );
        assert_eq!(filename_from_url("https://files.example.com/dir/"), None);
        assert_eq!(filename_from_url("https://files.example.com"), None);
    }

    #[test]
    fn default_name_fills_blank_names() {
        assert_eq!(non_empty_or(Some("  "), "doc.docx"), "doc.docx");
        assert_eq!(non_empty_or(None, "doc.docx"), "doc.docx");
        assert_eq!(non_empty_or(Some("a.docx"), "doc.docx"), "a.docx");
    }
}
