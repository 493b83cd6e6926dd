//! Typed Word actions.
//!
//! Each action knows its endpoint, how to turn its parameters into the
//! request body the service expects, and what its result looks like. The
//! submit/poll protocol and result unwrapping live elsewhere
//! ([`crate::client`], [`crate::execute`]); an action only prepares.
//!
//! | Action | Endpoint | Result |
//! |--------|----------|--------|
//! | [`AddTextWatermark`] | `WordAddTextWatermark` | document |
//! | [`AddImageWatermark`] | `AddImageWatermark` | document |
//! | [`ExtractMetadata`] | `ExtractMetadata` | JSON only |
//! | [`OptimizeDocument`] | `OptimizeDocument` | document |
//! | [`CompareDocuments`] | `CompareDocuments` | document |
//! | [`SplitDocument`] | `SplitDocument` | several documents |
//! | [`MergeDocuments`] | `MergeDocuments` | document |
//! | [`SecureDocument`] | `SecureDocument` | document |
//! | [`DeletePages`] | `DeletePages` | document |
//! | [`UpdateToc`] | `UpdateToc` | document |
//! | [`ReplaceText`] | `ReplaceText` | document |
//! | [`ReplaceTextWithImage`] | `ReplaceTextWithImage` | document |
//! | [`UpdateHeadersFooters`] | `UpdateHeadersFooters` | document |

mod content;
mod inspect;
mod maintenance;
mod pages;
mod watermark;

pub use content::{
    HeaderFooterContent, ReplaceText, ReplaceTextWithImage, TextFormatting, UpdateHeadersFooters,
};
pub use inspect::{CompareDocuments, CompareOptions, ExtractMetadata};
pub use maintenance::{
    OptimizationLevel, OptimizeDocument, ProtectionType, SecureDocument, TocOptions, UpdateToc,
};
pub use pages::{
    ComplianceLevel, DeletePages, FormatMode, MergeDocuments, MergeEntry, SplitDocument, SplitType,
};
pub use watermark::{
    AddImageWatermark, AddTextWatermark, ImageWatermarkOptions, TextWatermarkOptions,
    WatermarkOrientation,
};

use crate::client::Pdf4meClient;
use crate::document::ResolvedDocument;
use crate::error::Pdf4meError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Namespace shared by every Word endpoint.
pub const WORD_API_PREFIX: &str = "/office/ApiV2Word/";

/// Default culture sent with every action that takes one.
pub const DEFAULT_CULTURE: &str = "en-US";

/// What an action's successful result contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// One DOCX, saved as `<stem><suffix>.docx` (or `<fallback_stem>.docx`
    /// when the input has no name).
    Document {
        suffix: &'static str,
        fallback_stem: &'static str,
    },
    /// A `{Success, documents[]}` envelope of several DOCX parts.
    SplitParts,
    /// Structured JSON, no file.
    Metadata,
}

/// A request body ready for submission plus what the result step needs.
#[derive(Debug, Clone)]
pub struct PreparedJob {
    pub body: Value,
    /// Name of the primary input, used to derive output names.
    pub source_name: String,
    /// Parameters echoed into the operation's JSON output.
    pub details: Map<String, Value>,
}

/// A single Word action.
#[async_trait]
pub trait WordOperation: Send + Sync {
    /// Human label used in error messages ("Split Word document failed: ...").
    fn action(&self) -> &'static str;

    /// Endpoint path under the service root.
    fn endpoint(&self) -> &'static str;

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "",
            fallback_stem: "document",
        }
    }

    /// Caller-chosen output file name, if any.
    fn output_name(&self) -> Option<&str> {
        None
    }

    /// Resolve inputs and build the request body.
    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError>;
}

/// Any of the supported Word actions.
#[derive(Debug, Clone)]
pub enum Operation {
    AddTextWatermark(AddTextWatermark),
    AddImageWatermark(AddImageWatermark),
    ExtractMetadata(ExtractMetadata),
    OptimizeDocument(OptimizeDocument),
    CompareDocuments(CompareDocuments),
    SplitDocument(SplitDocument),
    MergeDocuments(MergeDocuments),
    SecureDocument(SecureDocument),
    DeletePages(DeletePages),
    UpdateToc(UpdateToc),
    ReplaceText(ReplaceText),
    ReplaceTextWithImage(ReplaceTextWithImage),
    UpdateHeadersFooters(UpdateHeadersFooters),
}

impl Operation {
    pub fn as_word_operation(&self) -> &dyn WordOperation {
        match self {
            Operation::AddTextWatermark(op) => op,
            Operation::AddImageWatermark(op) => op,
            Operation::ExtractMetadata(op) => op,
            Operation::OptimizeDocument(op) => op,
            Operation::CompareDocuments(op) => op,
            Operation::SplitDocument(op) => op,
            Operation::MergeDocuments(op) => op,
            Operation::SecureDocument(op) => op,
            Operation::DeletePages(op) => op,
            Operation::UpdateToc(op) => op,
            Operation::ReplaceText(op) => op,
            Operation::ReplaceTextWithImage(op) => op,
            Operation::UpdateHeadersFooters(op) => op,
        }
    }

    pub fn action(&self) -> &'static str {
        self.as_word_operation().action()
    }

    pub fn endpoint(&self) -> &'static str {
        self.as_word_operation().endpoint()
    }
}

macro_rules! impl_from_operation {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Operation {
                fn from(op: $variant) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

impl_from_operation!(
    AddTextWatermark,
    AddImageWatermark,
    ExtractMetadata,
    OptimizeDocument,
    CompareDocuments,
    SplitDocument,
    MergeDocuments,
    SecureDocument,
    DeletePages,
    UpdateToc,
    ReplaceText,
    ReplaceTextWithImage,
    UpdateHeadersFooters,
);

/// `{ "document": { <name_key>: name }, "docContent": base64 }`.
///
/// The service is inconsistent about `name` vs `Name` between endpoints.
pub(crate) fn document_body(name_key: &str, doc: &ResolvedDocument) -> Map<String, Value> {
    let mut document = Map::new();
    document.insert(name_key.to_string(), Value::String(doc.file_name.clone()));
    let mut body = Map::new();
    body.insert("document".into(), Value::Object(document));
    body.insert("docContent".into(), Value::String(doc.content_base64.clone()));
    body
}

/// Blank strings count as "not provided".
pub(crate) fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Serialize an options struct into a JSON object.
pub(crate) fn to_object<T: serde::Serialize>(value: &T) -> Result<Map<String, Value>, Pdf4meError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Pdf4meError::Internal(format!(
            "expected options to serialize to an object, got {other}"
        ))),
        Err(e) => Err(Pdf4meError::Internal(e.to_string())),
    }
}
