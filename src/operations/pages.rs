//! Page-level restructuring: split, merge, delete pages.

use super::{document_body, non_blank, PreparedJob, ResultShape, WordOperation, DEFAULT_CULTURE};
use crate::client::Pdf4meClient;
use crate::document::{resolve_document, DocumentSource};
use crate::error::Pdf4meError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ── Split ────────────────────────────────────────────────────────────────

/// How a document is cut into parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitType {
    #[default]
    Pages,
    Sections,
    Headings,
    Custom,
}

impl SplitType {
    /// Only page-based splits take explicit ranges.
    pub fn accepts_page_ranges(self) -> bool {
        matches!(self, SplitType::Pages | SplitType::Custom)
    }
}

/// Split a document into several DOCX parts.
#[derive(Debug, Clone)]
pub struct SplitDocument {
    pub document: DocumentSource,
    pub split_type: SplitType,
    /// e.g. `1-3,5,7-9`; ignored unless the split type is page-based.
    pub page_ranges: Option<String>,
    pub culture_name: String,
    /// Parts are saved as `<stem of this name>_part<n>.docx`.
    pub output_name: Option<String>,
}

impl SplitDocument {
    pub fn new(document: DocumentSource, split_type: SplitType) -> Self {
        Self {
            document,
            split_type,
            page_ranges: None,
            culture_name: DEFAULT_CULTURE.into(),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for SplitDocument {
    fn action(&self) -> &'static str {
        "Split Word document"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/SplitDocument"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::SplitParts
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        let doc = resolve_document(client, &self.document, "document.docx").await?;

        let mut body = document_body("Name", &doc);
        body.insert("splitType".into(), json!(self.split_type));
        body.insert("cultureName".into(), json!(self.culture_name));
        let ranges = non_blank(&self.page_ranges).filter(|_| self.split_type.accepts_page_ranges());
        if let Some(ranges) = ranges {
            body.insert("pageRanges".into(), json!(ranges));
        }

        let mut details = Map::new();
        details.insert("splitType".into(), json!(self.split_type));
        details.insert("pageRanges".into(), json!(ranges));
        details.insert("cultureName".into(), json!(self.culture_name));

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details,
        })
    }
}

// ── Merge ────────────────────────────────────────────────────────────────

/// How styles of merged documents are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormatMode {
    #[default]
    KeepSourceFormatting,
    KeepDifferentStyles,
    UseDestinationStyles,
}

/// OOXML conformance of the merged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComplianceLevel {
    #[serde(rename = "ECMA")]
    Ecma,
    #[default]
    Transitional,
    Strict,
    Custom,
}

/// One input of a merge.
#[derive(Debug, Clone)]
pub struct MergeEntry {
    pub source: DocumentSource,
    /// Position in the merged output; defaults to the entry's index.
    pub sort_position: Option<i64>,
}

/// Concatenate two or more documents.
#[derive(Debug, Clone)]
pub struct MergeDocuments {
    pub documents: Vec<MergeEntry>,
    pub format_mode: FormatMode,
    pub compliance_level: ComplianceLevel,
    pub output_name: Option<String>,
}

impl MergeDocuments {
    pub fn new(documents: Vec<DocumentSource>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|source| MergeEntry {
                    source,
                    sort_position: None,
                })
                .collect(),
            format_mode: FormatMode::default(),
            compliance_level: ComplianceLevel::default(),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for MergeDocuments {
    fn action(&self) -> &'static str {
        "Merge Word documents"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/MergeDocuments"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "",
            fallback_stem: "merged_document",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        if self.documents.len() < 2 {
            return Err(Pdf4meError::InvalidOperation(
                "At least 2 documents are required for merging".into(),
            ));
        }

        let mut resolved = Vec::with_capacity(self.documents.len());
        for (i, entry) in self.documents.iter().enumerate() {
            let default_name = format!("document{}.docx", i + 1);
            let doc = resolve_document(client, &entry.source, &default_name).await?;
            resolved.push((entry.sort_position.unwrap_or(i as i64), doc));
        }
        resolved.sort_by_key(|(position, _)| *position);

        let documents: Vec<Value> = resolved
            .iter()
            .map(|(position, doc)| {
                json!({
                    "Filename": doc.file_name,
                    "DocContent": doc.content_base64,
                    "SortPosition": position,
                    "FormatMode": self.format_mode,
                })
            })
            .collect();
        let names: Vec<&str> = resolved.iter().map(|(_, d)| d.file_name.as_str()).collect();

        let body = json!({
            "Documents": documents,
            "MergeOptions": { "ComplianceLevel": self.compliance_level },
        });

        let mut details = Map::new();
        details.insert("documentsMerged".into(), json!(resolved.len()));
        details.insert("documentNames".into(), json!(names));

        Ok(PreparedJob {
            body,
            // Output is named after the merge, not after any one input.
            source_name: String::new(),
            details,
        })
    }
}

// ── Delete pages ─────────────────────────────────────────────────────────

/// Remove a page range and/or a list of pages.
#[derive(Debug, Clone)]
pub struct DeletePages {
    pub document: DocumentSource,
    /// 1-indexed; `None` or 0 means "not set".
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    /// e.g. `1,3,5-7`.
    pub page_numbers: Option<String>,
    pub culture_name: Option<String>,
    pub output_name: Option<String>,
}

impl DeletePages {
    pub fn new(document: DocumentSource) -> Self {
        Self {
            document,
            start_page: None,
            end_page: None,
            page_numbers: None,
            culture_name: Some(DEFAULT_CULTURE.into()),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for DeletePages {
    fn action(&self) -> &'static str {
        "Delete pages from Word"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/DeletePages"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "_pages_deleted",
            fallback_stem: "document",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        let start = self.start_page.filter(|p| *p > 0);
        let end = self.end_page.filter(|p| *p > 0);
        let pages = non_blank(&self.page_numbers);
        if start.is_none() && end.is_none() && pages.is_none() {
            return Err(Pdf4meError::InvalidOperation(
                "Specify a start page, an end page or page numbers to delete".into(),
            ));
        }

        let doc = resolve_document(client, &self.document, "document.docx").await?;
        let mut body = document_body("name", &doc);
        let mut details = Map::new();
        if let Some(start) = start {
            body.insert("StartPage".into(), json!(start));
            details.insert("startPage".into(), json!(start));
        }
        if let Some(end) = end {
            body.insert("EndPage".into(), json!(end));
            details.insert("endPage".into(), json!(end));
        }
        if let Some(pages) = pages {
            body.insert("PageNumbers".into(), json!(pages));
            details.insert("pageNumbers".into(), json!(pages));
        }
        if let Some(culture) = non_blank(&self.culture_name) {
            body.insert("CultureName".into(), json!(culture));
        }

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details,
        })
    }
}
