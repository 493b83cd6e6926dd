//! Single-operation entry points.
//!
//! [`run_operation`] is the primary entry point of the library: it resolves
//! the operation's inputs, submits the job, waits for it and turns the result
//! into files plus a JSON summary. [`write_outputs`] saves those files.

use crate::client::Pdf4meClient;
use crate::document::artifact::{
    extract_payload, file_stem, force_docx_extension, output_file_name, split_parts, validate_docx,
};
use crate::document::OutputDocument;
use crate::error::Pdf4meError;
use crate::operations::{Operation, PreparedJob, ResultShape, WordOperation};
use crate::protocol::decode::DecodedResult;
use crate::protocol::transport::ContentKind;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Everything one operation produced.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutput {
    /// Action label, e.g. "Split Word document".
    pub action: String,
    /// Summary (or, for metadata, the service's answer) for the caller.
    pub json: Value,
    /// Produced files; empty for metadata extraction.
    #[serde(skip)]
    pub documents: Vec<OutputDocument>,
}

/// Run one Word action to completion.
///
/// # Errors
/// Every failure is wrapped as [`Pdf4meError::OperationFailed`], so the
/// message reads `"<action> failed: <cause>"`. Use [`Pdf4meError::root`] to
/// match on the cause.
pub async fn run_operation(
    client: &Pdf4meClient,
    operation: &Operation,
) -> Result<OperationOutput, Pdf4meError> {
    run_operation_with_cancel(client, operation, &CancellationToken::new()).await
}

/// Like [`run_operation`], aborting with [`Pdf4meError::Cancelled`] once
/// `cancel` fires.
pub async fn run_operation_with_cancel(
    client: &Pdf4meClient,
    operation: &Operation,
    cancel: &CancellationToken,
) -> Result<OperationOutput, Pdf4meError> {
    let op = operation.as_word_operation();
    execute(client, op, cancel)
        .await
        .map_err(|e| e.in_action(op.action()))
}

async fn execute(
    client: &Pdf4meClient,
    op: &dyn WordOperation,
    cancel: &CancellationToken,
) -> Result<OperationOutput, Pdf4meError> {
    let started = Instant::now();
    let endpoint = op.endpoint();
    info!("Running '{}'", op.action());

    // ── Resolve inputs + build body ──────────────────────────────────────
    let job = op.prepare(client).await?;
    debug!("Prepared '{}' for {}", job.source_name, endpoint);

    // ── Submit + wait ────────────────────────────────────────────────────
    let result = client
        .submit_with_cancel(
            endpoint,
            job.body.clone(),
            ContentKind::for_endpoint(endpoint),
            cancel,
        )
        .await?;

    // ── Unwrap result ────────────────────────────────────────────────────
    let output = match op.result_shape() {
        ResultShape::Document {
            suffix,
            fallback_stem,
        } => {
            let bytes = extract_payload(result)?;
            validate_docx(&bytes)?;
            let name = output_file_name(op.output_name(), &job.source_name, suffix, fallback_stem);
            document_output(op.action(), &job, OutputDocument::docx(name, bytes))
        }
        ResultShape::SplitParts => split_output(op, &job, result)?,
        ResultShape::Metadata => metadata_output(op.action(), &job, result)?,
    };

    info!(
        "'{}' finished in {}ms ({} file(s))",
        op.action(),
        started.elapsed().as_millis(),
        output.documents.len()
    );
    Ok(output)
}

fn document_output(action: &str, job: &PreparedJob, document: OutputDocument) -> OperationOutput {
    let json = json!({
        "success": true,
        "message": format!("{action} completed successfully"),
        "fileName": document.file_name,
        "mimeType": document.mime_type,
        "fileSize": document.size(),
        "sourceFileName": job.source_name,
        "options": job.details,
    });
    OperationOutput {
        action: action.to_string(),
        json,
        documents: vec![document],
    }
}

fn split_output(
    op: &dyn WordOperation,
    job: &PreparedJob,
    result: DecodedResult,
) -> Result<OperationOutput, Pdf4meError> {
    let map = match result {
        DecodedResult::Json(map) => map,
        DecodedResult::Binary(bytes) => {
            return Err(Pdf4meError::UnexpectedResponseShape {
                detail: format!("expected split envelope, got {} raw bytes", bytes.len()),
            })
        }
    };
    let parts = split_parts(&map)?;

    let base = op
        .output_name()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&job.source_name);
    let stem = match file_stem(base) {
        "" => "document",
        s => s,
    };

    let total_parts = parts.first().map(|p| p.total_parts).unwrap_or_default();
    let documents: Vec<OutputDocument> = parts
        .into_iter()
        .map(|p| {
            let name = force_docx_extension(&format!("{stem}_part{}", p.part_number));
            OutputDocument::docx(name, p.bytes)
        })
        .collect();

    let files: Vec<&str> = documents.iter().map(|d| d.file_name.as_str()).collect();
    let json = json!({
        "success": true,
        "message": format!("{} completed successfully", op.action()),
        "totalParts": total_parts,
        "savedParts": documents.len(),
        "files": files,
        "sourceFileName": job.source_name,
        "options": job.details,
    });
    Ok(OperationOutput {
        action: op.action().to_string(),
        json,
        documents,
    })
}

fn metadata_output(
    action: &str,
    job: &PreparedJob,
    result: DecodedResult,
) -> Result<OperationOutput, Pdf4meError> {
    let metadata = match result {
        DecodedResult::Json(map) => map,
        DecodedResult::Binary(bytes) => {
            return Err(Pdf4meError::UnexpectedResponseShape {
                detail: format!("expected metadata JSON, got {} raw bytes", bytes.len()),
            })
        }
    };
    Ok(OperationOutput {
        action: action.to_string(),
        json: json!({
            "success": true,
            "message": format!("{action} completed successfully"),
            "sourceFileName": job.source_name,
            "metadata": metadata,
        }),
        documents: Vec::new(),
    })
}

/// Write every produced document into `dir`, returning the written paths.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_outputs(
    dir: impl AsRef<Path>,
    output: &OperationOutput,
) -> Result<Vec<PathBuf>, Pdf4meError> {
    let dir = dir.as_ref();
    if output.documents.is_empty() {
        return Ok(Vec::new());
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Pdf4meError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut written = Vec::with_capacity(output.documents.len());
    for doc in &output.documents {
        let path = dir.join(&doc.file_name);
        let tmp_path = path.with_extension("docx.tmp");
        tokio::fs::write(&tmp_path, &doc.bytes)
            .await
            .map_err(|e| Pdf4meError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| Pdf4meError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;
        debug!("Wrote {} ({} bytes)", path.display(), doc.size());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn job(source: &str) -> PreparedJob {
        let mut details = Map::new();
        details.insert("splitType".into(), json!("Pages"));
        PreparedJob {
            body: json!({}),
            source_name: source.into(),
            details,
        }
    }

    #[test]
    fn document_summary_lists_file() {
        let out = document_output(
            "Optimize Word document",
            &job("a.docx"),
            OutputDocument::docx("a_optimized.docx", vec![0; 1200]),
        );
        assert_eq!(out.json["fileName"], "a_optimized.docx");
        assert_eq!(out.json["fileSize"], 1200);
        assert_eq!(out.json["message"], "Optimize Word document completed successfully");
        assert_eq!(out.documents.len(), 1);
    }

    #[test]
    fn metadata_rejects_binary() {
        let err = metadata_output("Extract Word metadata", &job("a.docx"), DecodedResult::Binary(vec![1]))
            .unwrap_err();
        assert!(matches!(err, Pdf4meError::UnexpectedResponseShape { .. }));
    }

    #[tokio::test]
    async fn write_outputs_creates_dir_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let out = OperationOutput {
            action: "x".into(),
            json: json!({}),
            documents: vec![
                OutputDocument::docx("one.docx", b"PK\x03\x04one".to_vec()),
                OutputDocument::docx("two.docx", b"PK\x03\x04two".to_vec()),
            ],
        };
        let paths = write_outputs(&target, &out).await.unwrap();
        assert_eq!(paths, vec![target.join("one.docx"), target.join("two.docx")]);
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"PK\x03\x04two");

        let names: Vec<String> = std::fs::read_dir(&target)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
    }

    #[tokio::test]
    async fn write_outputs_without_documents_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("unused");
        let out = OperationOutput {
            action: "Extract Word metadata".into(),
            json: json!({}),
            documents: vec![],
        };
        assert!(write_outputs(&target, &out).await.unwrap().is_empty());
        assert!(!target.exists());
    }
}
