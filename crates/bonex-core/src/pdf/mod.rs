//! PDF text extraction module.
//!
//! The parsing engine never inspects binary document structure; it
//! consumes an ordered line stream produced here.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for sources that yield receipt text lines.
pub trait LineSource {
    /// Load a document from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Extract the raw text of the entire document.
    fn extract_text(&self) -> Result<String>;

    /// All trimmed, non-empty lines of the document, pages in order.
    ///
    /// A receipt spanning several pages is one line stream; page breaks
    /// carry no meaning for the parser.
    fn lines(&self) -> Result<Vec<String>> {
        let text = self.extract_text()?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
