//! PDF text extraction backend for narration.
//!
//! Wraps `lopdf` page walking behind preview and whole-document extraction
//! with per-page progress reporting.

pub mod extractor;

pub use extractor::{PdfExtractor, PREVIEW_PAGES};
