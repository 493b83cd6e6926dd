//! Read-only and comparison actions.

use super::{document_body, to_object, PreparedJob, ResultShape, WordOperation, DEFAULT_CULTURE};
use crate::client::Pdf4meClient;
use crate::document::{resolve_document, DocumentSource};
use crate::error::Pdf4meError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Read document properties. The result is the service's JSON, no file.
#[derive(Debug, Clone)]
pub struct ExtractMetadata {
    pub document: DocumentSource,
    pub culture_name: String,
}

impl ExtractMetadata {
    pub fn new(document: DocumentSource) -> Self {
        Self {
            document,
            culture_name: DEFAULT_CULTURE.into(),
        }
    }
}

#[async_trait]
impl WordOperation for ExtractMetadata {
    fn action(&self) -> &'static str {
        "Extract Word metadata"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/ExtractMetadata"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Metadata
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        let doc = resolve_document(client, &self.document, "myWordFile.docx").await?;

        let mut body = document_body("name", &doc);
        body.insert("cultureName".into(), json!(self.culture_name));

        let mut details = Map::new();
        details.insert("cultureName".into(), json!(self.culture_name));

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details,
        })
    }
}

/// Which differences the comparison ignores, and who the revisions are
/// attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareOptions {
    pub ignore_formatting: bool,
    pub ignore_case: bool,
    pub ignore_comments: bool,
    pub ignore_tables: bool,
    pub ignore_fields: bool,
    pub ignore_footnotes: bool,
    pub ignore_textboxes: bool,
    pub ignore_headers_and_footers: bool,
    pub author: String,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            ignore_formatting: false,
            ignore_case: false,
            ignore_comments: false,
            ignore_tables: false,
            ignore_fields: false,
            ignore_footnotes: false,
            ignore_textboxes: false,
            ignore_headers_and_footers: false,
            author: "System Comparison".into(),
        }
    }
}

/// Compare two documents; the result is a DOCX with tracked changes.
#[derive(Debug, Clone)]
pub struct CompareDocuments {
    pub original: DocumentSource,
    pub revised: DocumentSource,
    pub options: CompareOptions,
    pub output_name: Option<String>,
}

impl CompareDocuments {
    pub fn new(original: DocumentSource, revised: DocumentSource) -> Self {
        Self {
            original,
            revised,
            options: CompareOptions::default(),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for CompareDocuments {
    fn action(&self) -> &'static str {
        "Compare Word documents"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/CompareDocuments"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "_compared",
            fallback_stem: "compared_documents",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        let original = resolve_document(client, &self.original, "original.docx").await?;
        let revised = resolve_document(client, &self.revised, "revised.docx").await?;

        let details = to_object(&self.options)?;
        let mut body = document_body("Name", &original);
        body.insert("compareWith".into(), json!(revised.content_base64));
        body.extend(details.clone());

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: original.file_name,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::offline_client;

    #[tokio::test]
    async fn metadata_body_and_default_name() {
        let job = ExtractMetadata::new(DocumentSource::base64("UEsDBA=="))
            .prepare(&offline_client())
            .await
            .unwrap();
        assert_eq!(
            job.body,
            json!({
                "document": { "name": "myWordFile.docx" },
                "docContent": "UEsDBA==",
                "cultureName": "en-US"
            })
        );
    }

    #[tokio::test]
    async fn compare_sends_both_documents_and_flags() {
        let mut op = CompareDocuments::new(
            DocumentSource::bytes(b"one".to_vec(), "v1.docx"),
            DocumentSource::base64("dHdv"),
        );
        op.options.ignore_case = true;
        let job = op.prepare(&offline_client()).await.unwrap();

        assert_eq!(job.body["document"]["Name"], "v1.docx");
        assert_eq!(job.body["docContent"], "b25l");
        assert_eq!(job.body["compareWith"], "dHdv");
        assert_eq!(job.body["ignoreCase"], true);
        assert_eq!(job.body["ignoreHeadersAndFooters"], false);
        assert_eq!(job.body["author"], "System Comparison");
        assert_eq!(job.source_name, "v1.docx");
    }

    #[test]
    fn compare_result_falls_back_to_fixed_stem() {
        let op = CompareDocuments::new(DocumentSource::base64("QQ=="), DocumentSource::base64("QQ=="));
        assert_eq!(
            op.result_shape(),
            ResultShape::Document {
                suffix: "_compared",
                fallback_stem: "compared_documents"
            }
        );
    }
}
