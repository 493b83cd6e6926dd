//! Response decoding: raw body + declared content kind → [`DecodedResult`].
//!
//! The service's content negotiation is not perfectly reliable: a binary
//! endpoint occasionally answers with a base64 string, or with a short plain
//! text error under a 200. [`decode`] is a total function over
//! [`ResponseBody`] so every combination has exactly one defined outcome.
//!
//! | Kind   | Body            | Outcome                                   |
//! |--------|-----------------|-------------------------------------------|
//! | Json   | JSON object     | pass through                              |
//! | Json   | text/bytes      | parsed; must be an object                 |
//! | Json   | other JSON      | `UnexpectedResponseShape`                 |
//! | Binary | bytes           | pass through                              |
//! | Binary | text < 100 chars| `UnexpectedShortResponse`                 |
//! | Binary | longer text     | base64 → bytes, else `UndecodableResponse`|
//! | Binary | JSON value      | legacy one-byte-per-char fallback         |

use crate::error::Pdf4meError;
use crate::protocol::transport::{ContentKind, ResponseBody};
use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
    Engine as _,
};
use serde_json::{Map, Value};

/// Valid binary payloads are never shorter than this many characters.
pub const SHORT_RESPONSE_THRESHOLD: usize = 100;

/// Characters of an undecodable body kept in the error for diagnostics.
pub const PREVIEW_CHARS: usize = 100;

/// The terminal artifact of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedResult {
    /// Structured response of a JSON endpoint.
    Json(Map<String, Value>),
    /// File bytes of a binary endpoint.
    Binary(Vec<u8>),
}

impl DecodedResult {
    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            DecodedResult::Json(m) => Some(m),
            DecodedResult::Binary(_) => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            DecodedResult::Binary(b) => Some(b),
            DecodedResult::Json(_) => None,
        }
    }
}

/// Normalise a success body according to the job's content kind.
pub fn decode(body: ResponseBody, kind: ContentKind) -> Result<DecodedResult, Pdf4meError> {
    match kind {
        ContentKind::Json => decode_json(body).map(DecodedResult::Json),
        ContentKind::Binary => decode_binary(body).map(DecodedResult::Binary),
    }
}

fn decode_json(body: ResponseBody) -> Result<Map<String, Value>, Pdf4meError> {
    let value = match body {
        ResponseBody::Json(v) => v,
        ResponseBody::Text(s) => parse_json(s.as_bytes(), &s)?,
        ResponseBody::Bytes(b) => parse_json(&b, &String::from_utf8_lossy(&b))?,
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Pdf4meError::UnexpectedResponseShape {
            detail: format!("expected a JSON object, got {}", json_type_name(&other)),
        }),
    }
}

fn parse_json(bytes: &[u8], text: &str) -> Result<Value, Pdf4meError> {
    serde_json::from_slice(bytes).map_err(|e| Pdf4meError::UnexpectedResponseShape {
        detail: format!("body is not JSON ({e}): {}", preview(text)),
    })
}

fn decode_binary(body: ResponseBody) -> Result<Vec<u8>, Pdf4meError> {
    match body {
        ResponseBody::Bytes(b) => Ok(b),
        ResponseBody::Text(s) => {
            if s.chars().count() < SHORT_RESPONSE_THRESHOLD {
                return Err(Pdf4meError::UnexpectedShortResponse { body: s });
            }
            decode_base64(&s).map_err(|_| Pdf4meError::UndecodableResponse {
                preview: preview(&s),
            })
        }
        // Legacy catch-all for an HTTP stack that hands back neither bytes
        // nor a string. Never observed against the live service; kept so the
        // function stays total.
        ResponseBody::Json(v) => {
            let text = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            Ok(latin1_bytes(&text))
        }
    }
}

/// Decode standard base64, padded or not, ignoring embedded whitespace.
pub fn decode_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(&cleaned)
        .or_else(|_| STANDARD_NO_PAD.decode(cleaned.trim_end_matches('=')))
}

/// Extract a human-readable message from an error response.
///
/// Tries `message`, `error`, `detail` on a JSON object body, in that order.
/// A JSON object without any of them yields `prefix` alone; a body that is
/// not JSON at all is appended raw.
pub fn error_message(prefix: &str, body: &ResponseBody) -> String {
    let parsed = match body {
        ResponseBody::Json(v) => Some(v.clone()),
        ResponseBody::Text(s) => serde_json::from_str::<Value>(s).ok(),
        ResponseBody::Bytes(b) => serde_json::from_slice::<Value>(b).ok(),
    };

    match parsed {
        Some(Value::Object(map)) => ["message", "error", "detail"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(non_empty_text)
            .unwrap_or_else(|| prefix.to_string()),
        _ => {
            let raw = body.to_text();
            if raw.trim().is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}: {raw}")
            }
        }
    }
}

fn non_empty_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn latin1_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| (c as u32 & 0xFF) as u8).collect()
}

fn preview(s: &str) -> String {
    s.chars().take(PREVIEW_CHARS).collect()
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_object_passes_through() {
        let out = decode(
            ResponseBody::Json(json!({ "docData": "abc" })),
            ContentKind::Json,
        )
        .unwrap();
        assert_eq!(out.as_json().unwrap()["docData"], "abc");
    }

    #[test]
    fn json_text_body_is_parsed() {
        let out = decode(
            ResponseBody::Text(r#"{"Success":true}"#.into()),
            ContentKind::Json,
        )
        .unwrap();
        assert_eq!(out.as_json().unwrap()["Success"], true);
    }

    #[test]
    fn json_non_object_is_rejected() {
        let err = decode(ResponseBody::Json(json!([1, 2])), ContentKind::Json).unwrap_err();
        assert!(matches!(err, Pdf4meError::UnexpectedResponseShape { .. }));
        assert!(err.to_string().contains("an array"));

        let err = decode(ResponseBody::Text("oops".into()), ContentKind::Json).unwrap_err();
        assert!(matches!(err, Pdf4meError::UnexpectedResponseShape { .. }));
    }

    #[test]
    fn binary_bytes_pass_through() {
        let out = decode(ResponseBody::Bytes(vec![1, 2, 3]), ContentKind::Binary).unwrap();
        assert_eq!(out.into_bytes().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn short_text_is_an_error_not_base64() {
        // 40 characters of perfectly valid base64.
        let body = "QUJDREVGR0hJSktMTU5PUFFSU1RVVldYWVo0NTY=".to_string();
        assert_eq!(body.len(), 40);
        let err = decode(ResponseBody::Text(body.clone()), ContentKind::Binary).unwrap_err();
        match err {
            Pdf4meError::UnexpectedShortResponse { body: b } => assert_eq!(b, body),
            other => panic!("expected UnexpectedShortResponse, got {other:?}"),
        }
    }

    #[test]
    fn long_base64_text_is_decoded() {
        let payload: Vec<u8> = (0..200u16).map(|i| (i % 251) as u8).collect();
        let encoded = STANDARD.encode(&payload);
        assert!(encoded.len() >= SHORT_RESPONSE_THRESHOLD);
        let out = decode(ResponseBody::Text(encoded), ContentKind::Binary).unwrap();
        assert_eq!(out.into_bytes().unwrap(), payload);
    }

    #[test]
    fn long_garbage_text_carries_preview() {
        let body = "<html>".to_string() + &"!".repeat(300);
        let err = decode(ResponseBody::Text(body), ContentKind::Binary).unwrap_err();
        match err {
            Pdf4meError::UndecodableResponse { preview } => {
                assert_eq!(preview.chars().count(), PREVIEW_CHARS);
                assert!(preview.starts_with("<html>"));
            }
            other => panic!("expected UndecodableResponse, got {other:?}"),
        }
    }

    #[test]
    fn legacy_fallback_is_one_byte_per_char() {
        let out = decode(ResponseBody::Json(json!("PK\u{3}\u{4}")), ContentKind::Binary).unwrap();
        assert_eq!(out.into_bytes().unwrap(), vec![0x50, 0x4B, 0x03, 0x04]);
    }

    #[test]
    fn base64_ignores_whitespace_and_padding() {
        assert_eq!(decode_base64("UEsD\nBA==").unwrap(), vec![0x50, 0x4B, 0x03, 0x04]);
        assert_eq!(decode_base64("UEsDBA").unwrap(), vec![0x50, 0x4B, 0x03, 0x04]);
    }

    #[test]
    fn error_message_prefers_message_field() {
        let body = ResponseBody::Text(r#"{"message":"quota exceeded"}"#.into());
        assert_eq!(error_message("API Error: 429", &body), "quota exceeded");

        let body = ResponseBody::Json(json!({ "error": "bad key", "detail": "x" }));
        assert_eq!(error_message("API Error: 401", &body), "bad key");

        let body = ResponseBody::Json(json!({ "detail": "missing docContent" }));
        assert_eq!(error_message("API Error: 400", &body), "missing docContent");
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        let body = ResponseBody::Bytes(b"Internal Server Error".to_vec());
        assert_eq!(
            error_message("API Error: 500", &body),
            "API Error: 500: Internal Server Error"
        );

        let body = ResponseBody::Json(json!({ "code": 7 }));
        assert_eq!(error_message("API Error: 500", &body), "API Error: 500");

        let body = ResponseBody::Text(String::new());
        assert_eq!(error_message("API Error: 502", &body), "API Error: 502");
    }
}
