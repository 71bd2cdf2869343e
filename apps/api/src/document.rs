//! Document Extractor — turns an uploaded PDF byte stream into plain text.
//!
//! Stateless: one call per upload, no side effects beyond reading the
//! input slice. Page texts are joined with newlines in page order so the
//! prompt builder sees the resume in reading order.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse PDF: {0}")]
    Parse(#[from] pdf_extract::OutputError),
}

/// Extracts the text of every page of `data` and joins the pages with `\n`.
///
/// Malformed or encrypted PDFs fail with `DocumentError::Parse`; a valid
/// PDF with no extractable text yields an empty string.
pub fn extract_text(data: &[u8]) -> Result<String, DocumentError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(data)?;
    Ok(join_pages(pages))
}

fn join_pages(pages: Vec<String>) -> String {
    pages.join("\n")
}
