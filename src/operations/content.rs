//! In-document content edits: text replacement, text → image, headers and
//! footers.

use super::{document_body, non_blank, to_object, PreparedJob, ResultShape, WordOperation, DEFAULT_CULTURE};
use crate::client::Pdf4meClient;
use crate::document::{resolve_document, DocumentSource};
use crate::error::Pdf4meError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ── Replace text ─────────────────────────────────────────────────────────

/// Formatting applied to replacement text. Serialized as `Formatting`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextFormatting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Hex colour, `#RRGGBB`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Find and replace text.
#[derive(Debug, Clone)]
pub struct ReplaceText {
    pub document: DocumentSource,
    pub search_text: String,
    pub replacement_text: String,
    pub match_case: bool,
    pub match_whole_word: bool,
    /// Treat `search_text` as a regular expression (evaluated server-side).
    pub use_regex: bool,
    pub formatting: Option<TextFormatting>,
    pub culture_name: String,
    pub output_name: Option<String>,
}

impl ReplaceText {
    pub fn new(
        document: DocumentSource,
        search_text: impl Into<String>,
        replacement_text: impl Into<String>,
    ) -> Self {
        Self {
            document,
            search_text: search_text.into(),
            replacement_text: replacement_text.into(),
            match_case: false,
            match_whole_word: false,
            use_regex: false,
            formatting: None,
            culture_name: DEFAULT_CULTURE.into(),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for ReplaceText {
    fn action(&self) -> &'static str {
        "Replace Text"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/ReplaceText"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "_text_replaced",
            fallback_stem: "document",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        if self.search_text.is_empty() {
            return Err(Pdf4meError::InvalidOperation(
                "Search text is required".into(),
            ));
        }
        let doc = resolve_document(client, &self.document, "document.docx").await?;

        let mut action = Map::new();
        action.insert("SearchText".into(), json!(self.search_text));
        action.insert("ReplacementText".into(), json!(self.replacement_text));
        action.insert("MatchCase".into(), json!(self.match_case));
        action.insert("MatchWholeWord".into(), json!(self.match_whole_word));
        action.insert("UseRegex".into(), json!(self.use_regex));
        if let Some(ref formatting) = self.formatting {
            action.insert("Formatting".into(), Value::Object(to_object(formatting)?));
        }

        let mut body = document_body("name", &doc);
        body.insert("ReplaceTextAction".into(), Value::Object(action.clone()));
        body.insert("cultureName".into(), json!(self.culture_name));

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details: action,
        })
    }
}

// ── Replace text with image ──────────────────────────────────────────────

/// Replace occurrences of a text marker with an image.
#[derive(Debug, Clone)]
pub struct ReplaceTextWithImage {
    pub document: DocumentSource,
    pub image: DocumentSource,
    pub find_text: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub maintain_aspect_ratio: bool,
    pub skip_first_page: bool,
    /// `all`, `first`, `last`, `odd`, `even` or `specific`.
    pub apply_to: String,
    pub page_numbers: Option<String>,
    pub ignore_page_numbers: Option<String>,
    pub culture_name: String,
    pub output_name: Option<String>,
}

impl ReplaceTextWithImage {
    pub fn new(document: DocumentSource, image: DocumentSource) -> Self {
        Self {
            document,
            image,
            find_text: None,
            width: None,
            height: None,
            maintain_aspect_ratio: true,
            skip_first_page: false,
            apply_to: "all".into(),
            page_numbers: None,
            ignore_page_numbers: None,
            culture_name: DEFAULT_CULTURE.into(),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for ReplaceTextWithImage {
    fn action(&self) -> &'static str {
        "Replace Text with Image"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/ReplaceTextWithImage"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "_text_replaced_with_image",
            fallback_stem: "document",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        let doc = resolve_document(client, &self.document, "document.docx").await?;
        let image = resolve_document(client, &self.image, "image.png").await?;

        let mut details = Map::new();
        details.insert("MaintainAspectRatio".into(), json!(self.maintain_aspect_ratio));
        details.insert("SkipFirstPage".into(), json!(self.skip_first_page));
        details.insert("ApplyTo".into(), json!(self.apply_to));
        details.insert("CultureName".into(), json!(self.culture_name));
        if let Some(find) = self.find_text.as_deref().filter(|f| !f.trim().is_empty()) {
            details.insert("FindText".into(), json!(find));
        }
        if let Some(width) = self.width {
            details.insert("Width".into(), json!(width));
        }
        if let Some(height) = self.height {
            details.insert("Height".into(), json!(height));
        }
        if let Some(pages) = non_blank(&self.page_numbers) {
            details.insert("PageNumbers".into(), json!(pages));
        }
        if let Some(pages) = non_blank(&self.ignore_page_numbers) {
            details.insert("IgnorePageNumbers".into(), json!(pages));
        }

        let mut body = document_body("Name", &doc);
        body.insert("ImageContent".into(), json!(image.content_base64));
        body.extend(details.clone());

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details,
        })
    }
}

// ── Headers and footers ──────────────────────────────────────────────────

/// Header/footer HTML per page class. Serialized as the service's
/// `UpdateHeadersFootersAction`; blank fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeaderFooterContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_pages_header_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_pages_footer_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_page_header_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_page_footer_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub even_pages_header_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub even_pages_footer_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odd_pages_header_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odd_pages_footer_html: Option<String>,
}

impl HeaderFooterContent {
    /// Same header and footer on every page. Plain text is valid HTML here.
    pub fn all_pages(header: Option<String>, footer: Option<String>) -> Self {
        Self {
            all_pages_header_html: header,
            all_pages_footer_html: footer,
            ..Default::default()
        }
    }

    /// Copy with blank entries dropped.
    fn without_blanks(&self) -> Self {
        let keep = |s: &Option<String>| s.clone().filter(|v| !v.is_empty());
        Self {
            all_pages_header_html: keep(&self.all_pages_header_html),
            all_pages_footer_html: keep(&self.all_pages_footer_html),
            first_page_header_html: keep(&self.first_page_header_html),
            first_page_footer_html: keep(&self.first_page_footer_html),
            even_pages_header_html: keep(&self.even_pages_header_html),
            even_pages_footer_html: keep(&self.even_pages_footer_html),
            odd_pages_header_html: keep(&self.odd_pages_header_html),
            odd_pages_footer_html: keep(&self.odd_pages_footer_html),
        }
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Replace headers and footers.
#[derive(Debug, Clone)]
pub struct UpdateHeadersFooters {
    pub document: DocumentSource,
    pub content: HeaderFooterContent,
    pub culture_name: Option<String>,
    pub output_name: Option<String>,
}

impl UpdateHeadersFooters {
    pub fn new(document: DocumentSource, content: HeaderFooterContent) -> Self {
        Self {
            document,
            content,
            culture_name: Some(DEFAULT_CULTURE.into()),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for UpdateHeadersFooters {
    fn action(&self) -> &'static str {
        "Update Headers and Footers"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/UpdateHeadersFooters"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "_headers_footers_updated",
            fallback_stem: "document",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        let content = self.content.without_blanks();
        if content.is_empty() {
            return Err(Pdf4meError::InvalidOperation(
                "At least one header or footer content must be provided".into(),
            ));
        }
        let doc = resolve_document(client, &self.document, "document.docx").await?;

        let mut action = to_object(&content)?;
        if let Some(culture) = non_blank(&self.culture_name) {
            action.insert("CultureName".into(), json!(culture));
        }

        let mut body = document_body("name", &doc);
        body.insert("UpdateHeadersFootersAction".into(), Value::Object(action.clone()));

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
        DocumentSource::Base64 {
            content: "UEsDBA==".into(),
            file_name: Some("memo.docx".into()),
        }
    }

    #[tokio::test]
    async fn replace_text_body() {
        let mut op = ReplaceText::new(doc(), "{{name}}", "Ada");
        op.match_case = true;
        let job = op.prepare(&offline_client()).await.unwrap();
        assert_eq!(
            job.body["ReplaceTextAction"],
            json!({
                "SearchText": "{{name}}",
                "ReplacementText": "Ada",
                "MatchCase": true,
                "MatchWholeWord": false,
                "UseRegex": false
            })
        );
        assert_eq!(job.body["cultureName"], "en-US");
        assert_eq!(job.body["document"]["name"], "memo.docx");
    }

    #[tokio::test]
    async fn replace_text_formatting_omits_unset_fields() {
        let mut op = ReplaceText::new(doc(), "a", "b");
        op.formatting = Some(TextFormatting {
            bold: true,
            color: Some("#FF0000".into()),
            ..Default::default()
        });
        let job = op.prepare(&offline_client()).await.unwrap();
        assert_eq!(
            job.body["ReplaceTextAction"]["Formatting"],
            json!({ "Bold": true, "Italic": false, "Underline": false, "Color": "#FF0000" })
        );
    }

    #[tokio::test]
    async fn replace_text_with_image_flattens_options() {
        let mut op = ReplaceTextWithImage::new(doc(), DocumentSource::bytes(vec![1, 2, 3], "x.png"));
        op.find_text = Some("[logo]".into());
        op.height = Some(40);
        op.page_numbers = Some("  ".into());
        let job = op.prepare(&offline_client()).await.unwrap();
        assert_eq!(job.body["document"]["Name"], "memo.docx");
        assert_eq!(job.body["ImageContent"], "AQID");
        assert_eq!(job.body["FindText"], "[logo]");
        assert_eq!(job.body["Height"], 40);
        assert_eq!(job.body["ApplyTo"], "all");
        assert_eq!(job.body["MaintainAspectRatio"], true);
        assert!(job.body.get("Width").is_none());
        assert!(job.body.get("PageNumbers").is_none());
    }

    #[tokio::test]
    async fn headers_footers_require_content() {
        let op = UpdateHeadersFooters::new(
            doc(),
            HeaderFooterContent::all_pages(Some(String::new()), None),
        );
        let err = op.prepare(&offline_client()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "At least one header or footer content must be provided"
        );
    }

    #[tokio::test]
    async fn headers_footers_body() {
        let mut content = HeaderFooterContent::all_pages(Some("ACME".into()), None);
        content.first_page_footer_html = Some("<b>Page 1</b>".into());
        let job = UpdateHeadersFooters::new(doc(), content)
            .prepare(&offline_client())
            .await
            .unwrap();
        assert_eq!(
            job.body["UpdateHeadersFootersAction"],
            json!({
                "AllPagesHeaderHtml": "ACME",
                "FirstPageFooterHtml": "<b>Page 1</b>",
                "CultureName": "en-US"
            })
        );
    }
}
