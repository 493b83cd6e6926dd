//! Text and image watermarks.

use super::{document_body, to_object, PreparedJob, ResultShape, WordOperation, DEFAULT_CULTURE};
use crate::client::Pdf4meClient;
use crate::document::{resolve_document, DocumentSource};
use crate::error::Pdf4meError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction of a text watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WatermarkOrientation {
    Horizontal,
    Vertical,
    #[default]
    Diagonal,
    #[serde(rename = "Upside-Down")]
    UpsideDown,
}

/// Serialized as the service's `TextWatermarkAction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextWatermarkOptions {
    pub watermark_text: String,
    pub font_family: String,
    pub font_size: u32,
    /// Hex colour, `#RRGGBB`.
    pub font_color: String,
    pub semi_transparent: bool,
    /// Degrees.
    pub rotation: i32,
    pub orientation: WatermarkOrientation,
    pub culture_name: String,
}

impl Default for TextWatermarkOptions {
    fn default() -> Self {
        Self {
            watermark_text: "CONFIDENTIAL".into(),
            font_family: "Arial".into(),
            font_size: 72,
            font_color: "#808080".into(),
            semi_transparent: true,
            rotation: 45,
            orientation: WatermarkOrientation::Diagonal,
            culture_name: DEFAULT_CULTURE.into(),
        }
    }
}

/// Stamp a text watermark across every page.
#[derive(Debug, Clone)]
pub struct AddTextWatermark {
    pub document: DocumentSource,
    pub options: TextWatermarkOptions,
    pub output_name: Option<String>,
}

impl AddTextWatermark {
    pub fn new(document: DocumentSource, text: impl Into<String>) -> Self {
        Self {
            document,
            options: TextWatermarkOptions {
                watermark_text: text.into(),
                ..Default::default()
            },
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for AddTextWatermark {
    fn action(&self) -> &'static str {
        "Add text watermark to Word"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/WordAddTextWatermark"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "",
            fallback_stem: "word_with_watermark",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        if self.options.watermark_text.trim().is_empty() {
            return Err(Pdf4meError::InvalidOperation(
                "Watermark text is required".into(),
            ));
        }
        let doc = resolve_document(client, &self.document, "myWordFile.docx").await?;
        let action = to_object(&self.options)?;

        let mut body = document_body("name", &doc);
        body.insert("TextWatermarkAction".into(), Value::Object(action.clone()));
        body.insert("IsAsync".into(), Value::Bool(true));

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details: action,
        })
    }
}

/// Serialized as the service's `AddWatermarkAction`, minus the image itself.
///
/// `width`/`height` override `scale` when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageWatermarkOptions {
    pub scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub align_image: bool,
    pub semi_transparent: bool,
    pub culture_name: String,
}

impl Default for ImageWatermarkOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            width: None,
            height: None,
            align_image: true,
            semi_transparent: false,
            culture_name: DEFAULT_CULTURE.into(),
        }
    }
}

/// Place an image watermark on every page.
#[derive(Debug, Clone)]
pub struct AddImageWatermark {
    pub document: DocumentSource,
    pub image: DocumentSource,
    pub options: ImageWatermarkOptions,
    pub output_name: Option<String>,
}

impl AddImageWatermark {
    pub fn new(document: DocumentSource, image: DocumentSource) -> Self {
        Self {
            document,
            image,
            options: ImageWatermarkOptions::default(),
            output_name: None,
        }
    }
}

#[async_trait]
impl WordOperation for AddImageWatermark {
    fn action(&self) -> &'static str {
        "Add image watermark to Word document"
    }

    fn endpoint(&self) -> &'static str {
        "/office/ApiV2Word/AddImageWatermark"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Document {
            suffix: "",
            fallback_stem: "word_with_watermark",
        }
    }

    fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    async fn prepare(&self, client: &Pdf4meClient) -> Result<PreparedJob, Pdf4meError> {
        let doc = resolve_document(client, &self.document, "document.docx").await?;
        let image = resolve_document(client, &self.image, "watermark.png").await?;

        let details = to_object(&self.options)?;
        let mut action = details.clone();
        action.insert(
            "WatermarkFileContent".into(),
            Value::String(image.content_base64),
        );

        let mut body = document_body("name", &doc);
        body.insert("AddWatermarkAction".into(), Value::Object(action));

        Ok(PreparedJob {
            body: Value::Object(body),
            source_name: doc.file_name,
            details,
        })
    }
}
