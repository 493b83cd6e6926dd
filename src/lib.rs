//! # pdf4me-word
//!
//! Async client for the PDF4me Word API: watermarking, comparison, merging,
//! splitting, metadata extraction, text/image replacement, header/footer
//! updates, protection, optimisation, TOC refresh and page deletion.
//!
//! All document processing happens on the remote service. This crate
//! marshals inputs, submits jobs, follows the service's asynchronous job
//! protocol and turns the results back into DOCX files.
//!
//! ## Job Lifecycle
//!
//! ```text
//! Operation
//!  │
//!  ├─ 1. Resolve  bytes / base64 / URL / local file → base64 + name
//!  ├─ 2. Prepare  action-specific JSON body
//!  ├─ 3. Submit   POST; 200 ⇒ done, 202 + Location ⇒ poll
//!  ├─ 4. Poll     GET Location; wait between attempts (remote delay or sleep)
//!  ├─ 5. Unwrap   locate the document field, validate DOCX magic + size
//!  └─ 6. Output   named files + JSON summary
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf4me_word::{run_operation, write_outputs, AddTextWatermark, ClientConfig, DocumentSource, Pdf4meClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads PDF4ME_API_KEY (and optionally PDF4ME_BASE_URL)
//!     let client = Pdf4meClient::new(ClientConfig::from_env()?)?;
//!     let op = AddTextWatermark::new(DocumentSource::from_arg("contract.docx"), "DRAFT");
//!     let output = run_operation(&client, &op.into()).await?;
//!     write_outputs("out", &output).await?;
//!     println!("{}", output.json);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf4me-word` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf4me-word = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod execute;
pub mod operations;
pub mod progress;
pub mod protocol;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{run_batch, run_batch_stream, BatchItemResult, BatchStream};
pub use client::Pdf4meClient;
pub use config::{ClientConfig, ClientConfigBuilder, DelayStrategy};
pub use document::{DocumentSource, OutputDocument, ResolvedDocument, DOCX_MIME};
pub use error::{Pdf4meError, TransportFailure, TransportFailureKind};
pub use execute::{run_operation, run_operation_with_cancel, write_outputs, OperationOutput};
pub use operations::*;
pub use progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback};
pub use protocol::decode::DecodedResult;
pub use protocol::transport::ContentKind;
