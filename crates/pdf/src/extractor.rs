//! PDF extractor implementation.

use lopdf::Document;
use narrator_core::{Error, Result, TextNormalizer};
use std::path::Path;

/// Number of pages a document preview covers.
pub const PREVIEW_PAGES: usize = 3;

/// Extractor for the text content of PDF documents.
///
/// Stateless. The `lopdf` document handle is opened inside each call and
/// released on every exit path; handles are never cached across calls.
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self
    }

    /// Number of pages in the document.
    pub fn page_count(&self, path: &Path) -> Result<usize> {
        let doc = self.open(path)?;
        Ok(doc.get_pages().len())
    }

    /// Extract normalized text from the first `max_pages` pages.
    ///
    /// Display-only: the result is a bounded prefix of the document, not
    /// its full content. Returns an empty string when `max_pages` is zero
    /// or the document has no pages.
    pub fn extract_preview(&self, path: &Path, max_pages: usize) -> Result<String> {
        let doc = self.open(path)?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().take(max_pages).collect();

        let mut parts = Vec::with_capacity(pages.len());
        for page in pages {
            parts.push(self.page_text(&doc, page)?);
        }

        Ok(TextNormalizer::new().normalize(&parts.join("\n")))
    }

    /// Extract normalized text from every page, reporting progress.
    ///
    /// `on_progress` fires once per completed page with the whole-percent
    /// completion: non-decreasing values ending at 100. It runs on the
    /// calling thread; callers that need the values elsewhere forward
    /// them themselves.
    ///
    /// On any failure the partial text is discarded and an error returned.
    pub fn extract_all(&self, path: &Path, mut on_progress: impl FnMut(u8)) -> Result<String> {
        let doc = self.open(path)?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        let total = pages.len();
        log::debug!("extracting {} pages from {}", total, path.display());

        let mut parts = Vec::with_capacity(total);
        for (idx, page) in pages.into_iter().enumerate() {
            parts.push(self.page_text(&doc, page)?);
            on_progress(((idx + 1) * 100 / total) as u8);
        }

        Ok(TextNormalizer::new().normalize(&parts.join("\n")))
    }

    /// Open a document for the duration of one extraction call.
    fn open(&self, path: &Path) -> Result<Document> {
        let doc = Document::load(path)
            .map_err(|e| Error::document(format!("failed to open {}: {}", path.display(), e)))?;

        if doc.is_encrypted() {
            return Err(Error::document(format!("{} is encrypted", path.display())));
        }

        Ok(doc)
    }

    /// Pull the raw text of a single page.
    fn page_text(&self, doc: &Document, page: u32) -> Result<String> {
        doc.extract_text(&[page]).map_err(|e| {
            Error::document(format!("failed to extract text from page {}: {}", page, e))
        })
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a PDF with one line of text per page.
    fn write_pdf(path: &Path, page_texts: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_preview_covers_first_pages_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("five.pdf");
        write_pdf(
            &path,
            &["Page one", "Page two", "Page three", "Page four", "Page five"],
        );

        let extractor = PdfExtractor::new();
        let preview = extractor.extract_preview(&path, 3).unwrap();
        assert_eq!(preview, "Page one\nPage two\nPage three");
    }

    #[test]
    fn test_preview_independent_of_document_length() {
        let dir = tempfile::tempdir().unwrap();
        let long = dir.path().join("long.pdf");
        let short = dir.path().join("short.pdf");
        write_pdf(&long, &["Alpha", "Beta", "Gamma", "Delta", "Epsilon"]);
        write_pdf(&short, &["Alpha", "Beta", "Gamma"]);

        let extractor = PdfExtractor::new();
        assert_eq!(
            extractor.extract_preview(&long, 3).unwrap(),
            extractor.extract_preview(&short, 3).unwrap()
        );
    }

    #[test]
    fn test_preview_shorter_than_limit_returns_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.pdf");
        write_pdf(&path, &["First", "Second"]);

        let extractor = PdfExtractor::new();
        let preview = extractor.extract_preview(&path, 3).unwrap();
        assert_eq!(preview, "First\nSecond");
    }

    #[test]
    fn test_preview_zero_pages_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        write_pdf(&path, &["Something"]);

        let extractor = PdfExtractor::new();
        assert_eq!(extractor.extract_preview(&path, 0).unwrap(), "");
    }

    #[test]
    fn test_extract_all_returns_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("five.pdf");
        write_pdf(
            &path,
            &["Page one", "Page two", "Page three", "Page four", "Page five"],
        );

        let extractor = PdfExtractor::new();
        let text = extractor.extract_all(&path, |_| {}).unwrap();
        assert_eq!(
            text,
            "Page one\nPage two\nPage three\nPage four\nPage five"
        );
    }

    #[test]
    fn test_progress_fires_once_per_page_and_ends_at_100() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("five.pdf");
        write_pdf(&path, &["a", "b", "c", "d", "e"]);

        let extractor = PdfExtractor::new();
        let mut seen = Vec::new();
        extractor.extract_all(&path, |pct| seen.push(pct)).unwrap();

        assert_eq!(seen, vec![20, 40, 60, 80, 100]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_empty_document_yields_empty_text_and_no_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        write_pdf(&path, &[]);

        let extractor = PdfExtractor::new();
        let mut events = 0;
        let text = extractor.extract_all(&path, |_| events += 1).unwrap();
        assert_eq!(text, "");
        assert_eq!(events, 0);
    }

    #[test]
    fn test_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pdf");
        write_pdf(&path, &["a", "b", "c"]);

        assert_eq!(PdfExtractor::new().page_count(&path).unwrap(), 3);
    }

    #[test]
    fn test_missing_file_is_document_error() {
        let extractor = PdfExtractor::new();
        let err = extractor
            .extract_preview(Path::new("/nonexistent/missing.pdf"), 3)
            .unwrap_err();
        assert!(matches!(err, Error::Document(_)));
    }

    #[test]
    fn test_garbage_file_is_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-pdf.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let extractor = PdfExtractor::new();
        let err = extractor.extract_all(&path, |_| {}).unwrap_err();
        assert!(matches!(err, Error::Document(_)));
    }

    #[test]
    fn test_encrypted_document_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Encrypt", Object::Null);
        doc.save(&path).unwrap();

        let err = PdfExtractor::new()
            .extract_preview(&path, 3)
            .unwrap_err();
        assert!(matches!(err, Error::Document(_)));
    }

    #[test]
    fn test_extraction_output_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messy.pdf");
        write_pdf(&path, &["  spaced   out  ", "second   page"]);

        let extractor = PdfExtractor::new();
        let text = extractor.extract_all(&path, |_| {}).unwrap();
        assert_eq!(text, "spaced out\nsecond page");
    }
}
