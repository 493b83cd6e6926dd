//! Whole-document maintenance: size optimisation, protection, TOC refresh.

use super::{document_body, to_object, PreparedJob, ResultShape, WordOperation, DEFAULT_CULTURE};
use crate::client::Pdf4meClient;
use crate::document::{resolve_document, DocumentSource};
use crate::error::Pdf4meError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OptimizationLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Shrink a document (image recompression, unused style removal).
#[derive(Debug, Clone)]
pub struct OptimizeDocument {
    pub document: DocumentSource,
    pub level: OptimizationLevel,
    pub culture_name: String,
    pub output_name: Option<String>,
}

impl OptimizeDocument {
    pub fn new(document: DocumentSource) -> Self {
        Self {
            document,
            level: OptimizationLevel::default(),
            culture_name: DEFAULT_CULTURE.into(),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for OptimizeDocument {
    fn action(&self) -> &'static str {
        "Optimize Word document"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/OptimizeDocument"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "_optimized",
            fallback_stem: "document",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        let doc = resolve_document(client, &self.document, "document.docx").await?;

        let mut details = Map::new();
        details.insert("OptimizationLevel".into(), json!(self.level));
        details.insert("CultureName".into(), json!(self.culture_name));

        let mut body = document_body("Name", &doc);
        body.extend(details.clone());

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details,
        })
    }
}

/// What the password unlocks for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtectionType {
    #[default]
    ReadOnly,
    CommentsOnly,
    FormsOnly,
    TrackedChanges,
}

/// Password-protect a document.
#[derive(Clone)]
pub struct SecureDocument {
    pub document: DocumentSource,
    pub password: String,
    pub protection: ProtectionType,
    pub culture_name: String,
    pub output_name: Option<String>,
}

impl std::fmt::Debug for SecureDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureDocument")
            .field("document", &self.document)
            .field("password", &"[redacted]")
            .field("protection", &self.protection)
            .field("culture_name", &self.culture_name)
            .field("output_name", &self.output_name)
            .finish()
    }
}

impl SecureDocument {
    pub fn new(document: DocumentSource, password: impl Into<String>) -> Self {
        Self {
            document,
            password: password.into(),
            protection: ProtectionType::default(),
            culture_name: DEFAULT_CULTURE.into(),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for SecureDocument {
    fn action(&self) -> &'static str {
        "Secure Word document"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/SecureDocument"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "_secured",
            fallback_stem: "document",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        if self.password.is_empty() {
            return Err(Pdf4meError::InvalidOperation(
                "A password is required to secure the document".into(),
            ));
        }
        let doc = resolve_document(client, &self.document, "document.docx").await?;

        // The password goes to the service but never into the echoed details.
        let mut details = Map::new();
        details.insert("ProtectionType".into(), json!(self.protection));
        details.insert("CultureName".into(), json!(self.culture_name));

        let mut body = document_body("Name", &doc);
        body.insert("Password".into(), json!(self.password));
        body.extend(details.clone());

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details,
        })
    }
}

/// Serialized as the service's `UpdateTocAction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TocOptions {
    /// Deepest heading level listed (1-9).
    pub max_heading_level: u8,
    pub include_page_numbers: bool,
    pub right_align_page_numbers: bool,
    pub tab_leader: String,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            max_heading_level: 3,
            include_page_numbers: true,
            right_align_page_numbers: true,
            tab_leader: "Dots".into(),
        }
    }
}

/// Refresh the table of contents.
#[derive(Debug, Clone)]
pub struct UpdateToc {
    pub document: DocumentSource,
    pub options: TocOptions,
    pub culture_name: String,
    pub output_name: Option<String>,
}

impl UpdateToc {
    pub fn new(document: DocumentSource) -> Self {
        Self {
            document,
            options: TocOptions::default(),
            culture_name: DEFAULT_CULTURE.into(),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for UpdateToc {
    fn action(&self) -> &'static str {
        "Update table of contents"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/UpdateToc"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "_toc_updated",
            fallback_stem: "document",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        if !(1..=9).contains(&self.options.max_heading_level) {
            return Err(Pdf4meError::InvalidOperation(format!(
                "Heading level must be between 1 and 9, got {}",
                self.options.max_heading_level
            )));
        }
        let doc = resolve_document(client, &self.document, "document.docx").await?;

        let action = to_object(&self.options)?;
        let mut body = document_body("Name", &doc);
        body.insert("UpdateTocAction".into(), Value::Object(action.clone()));
        body.insert("CultureName".into(), json!(self.culture_name));

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details: action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::offline_client;

    fn doc() -> DocumentSource {
        DocumentSource::bytes(b"PK\x03\x04".to_vec(), "report.docx")
    }

    #[tokio::test]
    async fn optimize_body() {
        let mut op = OptimizeDocument::new(doc());
        op.level = OptimizationLevel::High;
        let job = op.prepare(&offline_client()).await.unwrap();
        assert_eq!(job.body["OptimizationLevel"], "High");
        assert_eq!(job.body["CultureName"], "en-US");
        assert_eq!(job.body["document"]["Name"], "report.docx");
    }

    #[tokio::test]
    async fn secure_requires_password_and_hides_it() {
        let err = SecureDocument::new(doc(), "")
            .prepare(&offline_client())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf4meError::InvalidOperation(_)));

        let op = SecureDocument::new(doc(), "s3cret");
        let job = op.prepare(&offline_client()).await.unwrap();
        assert_eq!(job.body["Password"], "s3cret");
        assert_eq!(job.body["ProtectionType"], "ReadOnly");
        assert!(job.details.get("Password").is_none());
        assert!(!format!("{op:?}").contains("s3cret"));
    }

    #[tokio::test]
    async fn toc_defaults() {
        let job = UpdateToc::new(doc()).prepare(&offline_client()).await.unwrap();
        assert_eq!(
            job.body["UpdateTocAction"],
            json!({
                "MaxHeadingLevel": 3,
                "IncludePageNumbers": true,
                "RightAlignPageNumbers": true,
                "TabLeader": "Dots"
            })
        );
    }

    #[tokio::test]
    async fn toc_rejects_out_of_range_level() {
        let mut op = UpdateToc::new(doc());
        op.options.max_heading_level = 0;
        assert!(op.prepare(&offline_client()).await.is_err());
    }
}
