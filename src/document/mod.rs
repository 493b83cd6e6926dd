//! Documents going in and out of the service.
//!
//! - [`input`]: caller source → base64 content + file name
//! - [`artifact`]: job result → validated DOCX bytes + output name

pub mod artifact;
pub mod input;

pub use artifact::{OutputDocument, DOCX_MIME};
pub use input::{resolve_document, DocumentSource, ResolvedDocument};
