//! Result unwrapping: decoded job result → validated DOCX bytes and the
//! file name they are saved under.
//!
//! Word endpoints embed the produced file in JSON, and the field that holds
//! it is not stable across endpoints. Extraction walks an ordered list of
//! candidate fields and takes the first non-empty one.

use crate::error::Pdf4meError;
use crate::protocol::decode::{decode_base64, DecodedResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// MIME type of every document this crate produces.
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Smallest plausible DOCX; anything shorter is treated as corrupt.
pub const MIN_DOCX_BYTES: usize = 1000;

/// Local file header signature of a ZIP container.
pub const DOCX_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Fields checked inside a `document` object, in order.
const NESTED_FIELDS: &[&str] = &["docData", "content", "docContent", "data", "file"];

/// Fields checked on the top-level object when there is no `document`.
const TOP_LEVEL_FIELDS: &[&str] = &["docContent", "docData", "content", "fileContent", "data"];

/// A produced file, ready to be written or handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl OutputDocument {
    pub fn docx(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: DOCX_MIME.to_string(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Pull the document bytes out of a job result.
pub fn extract_payload(result: DecodedResult) -> Result<Vec<u8>, Pdf4meError> {
    match result {
        DecodedResult::Binary(bytes) => Ok(bytes),
        DecodedResult::Json(map) => extract_from_json(&map),
    }
}

fn extract_from_json(map: &Map<String, Value>) -> Result<Vec<u8>, Pdf4meError> {
    match map.get("document").filter(|d| is_present(d)) {
        Some(Value::String(s)) => decode_field(s),
        Some(Value::Object(doc)) => match first_text(doc, NESTED_FIELDS) {
            Some(s) => decode_field(s),
            None => Err(Pdf4meError::MalformedArtifact {
                reason: format!(
                    "Document object has unexpected structure. Available keys: {}",
                    keys_of(doc)
                ),
            }),
        },
        Some(other) => Err(Pdf4meError::MalformedArtifact {
            reason: format!(
                "Document field is neither string nor object: {}",
                json_kind(other)
            ),
        }),
        None => match first_text(map, TOP_LEVEL_FIELDS) {
            Some(s) => decode_field(s),
            None => Err(Pdf4meError::MalformedArtifact {
                reason: format!(
                    "Word API returned unexpected JSON structure. Available keys: {}",
                    keys_of(map)
                ),
            }),
        },
    }
}

/// Reject payloads that cannot be a DOCX file.
pub fn validate_docx(bytes: &[u8]) -> Result<(), Pdf4meError> {
    if bytes.len() < MIN_DOCX_BYTES {
        return Err(Pdf4meError::MalformedArtifact {
            reason: "Invalid Word response from API. The file appears to be too small or corrupted."
                .into(),
        });
    }
    if bytes[..4] != DOCX_MAGIC {
        return Err(Pdf4meError::MalformedArtifact {
            reason: format!(
                "Invalid Word file format. Expected DOCX file but got unexpected data. Magic bytes: {}",
                hex_prefix(bytes)
            ),
        });
    }
    Ok(())
}

/// One valid part of a split result, numbered by its position in the
/// service's `documents` array (1-indexed, gaps kept).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPart {
    pub part_number: usize,
    pub total_parts: usize,
    pub bytes: Vec<u8>,
}

/// Unpack a `{Success, ErrorMessage, Errors, documents[]}` split response.
///
/// Parts that are not strings, not base64 or not valid DOCX files are skipped.
pub fn split_parts(map: &Map<String, Value>) -> Result<Vec<SplitPart>, Pdf4meError> {
    if !map.get("Success").and_then(Value::as_bool).unwrap_or(false) {
        let message = map
            .get("ErrorMessage")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown error");
        let errors: Vec<String> = map
            .get("Errors")
            .and_then(Value::as_array)
            .map(|a| a.iter().map(value_text).collect())
            .unwrap_or_default();
        let mut full = format!("Split operation failed: {message}");
        if !errors.is_empty() {
            full.push_str(". Errors: ");
            full.push_str(&errors.join(", "));
        }
        return Err(Pdf4meError::RemoteProcessing {
            status: 200,
            message: full,
        });
    }

    let documents = map
        .get("documents")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| Pdf4meError::MalformedArtifact {
            reason: "No documents returned from split operation".into(),
        })?;

    let total_parts = documents.len();
    let parts: Vec<SplitPart> = documents
        .iter()
        .enumerate()
        .filter_map(|(i, doc)| {
            let encoded = doc.as_str().filter(|s| !s.is_empty())?;
            let bytes = match decode_base64(encoded) {
                Ok(b) => b,
                Err(e) => {
                    warn!("Skipping split part {}: not base64 ({})", i + 1, e);
                    return None;
                }
            };
            if let Err(e) = validate_docx(&bytes) {
                warn!("Skipping split part {}: {}", i + 1, e);
                return None;
            }
            Some(SplitPart {
                part_number: i + 1,
                total_parts,
                bytes,
            })
        })
        .collect();

    if parts.is_empty() {
        return Err(Pdf4meError::MalformedArtifact {
            reason: "No valid documents could be extracted from split operation".into(),
        });
    }
    Ok(parts)
}

/// Name of a produced file.
///
/// A non-blank `requested` name wins; otherwise `<stem of original><suffix>.docx`,
/// or `<fallback_stem>.docx` when there is no original name. Any extension
/// other than `.docx` is replaced.
pub fn output_file_name(
    requested: Option<&str>,
    original: &str,
    suffix: &str,
    fallback_stem: &str,
) -> String {
    let name = match requested.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => {
            let stem = file_stem(original);
            if stem.is_empty() {
                format!("{fallback_stem}.docx")
            } else {
                format!("{stem}{suffix}.docx")
            }
        }
    };
    force_docx_extension(&name)
}

/// `report.pdf` → `report.docx`; `report` → `report.docx`.
pub fn force_docx_extension(name: &str) -> String {
    if name.to_lowercase().ends_with(".docx") {
        name.to_string()
    } else {
        format!("{}.docx", file_stem(name))
    }
}

/// Everything before the last `.`, or the whole name if it has none.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

fn decode_field(s: &str) -> Result<Vec<u8>, Pdf4meError> {
    decode_base64(s).map_err(|e| Pdf4meError::MalformedArtifact {
        reason: format!("Document content is not valid base64: {e}"),
    })
}

fn first_text<'a>(map: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|f| map.get(*f))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
}

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn keys_of(map: &Map<String, Value>) -> String {
    map.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::Array(_) => "array",
        _ => "unknown",
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(4).map(|b| format!("{b:02x}")).collect()
}
