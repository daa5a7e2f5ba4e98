//! Helper functions for PDF inspection in tests.

use anyhow::Result;
use retitle::PdfDocument;
use std::path::Path;

/// Visible text of page 0 as the crate's own text index sees it.
pub fn first_page_text(pdf_path: &Path) -> Result<String> {
    Ok(retitle::first_page_text(pdf_path)?)
}

/// Text of the whole document as pdf-extract sees it.
pub fn extract_text(pdf_path: &Path) -> Result<String> {
    Ok(retitle::extract_text_from_pdf(pdf_path)?)
}

pub fn page_count(pdf_path: &Path) -> Result<usize> {
    Ok(PdfDocument::open(pdf_path)?.page_count())
}

/// Decoded content bytes of the page at `index`.
pub fn page_content(pdf_path: &Path, index: usize) -> Result<Vec<u8>> {
    Ok(PdfDocument::open(pdf_path)?.page_content(index)?)
}

/// Checks if a file looks like a PDF.
pub fn is_valid_pdf(path: &Path) -> bool {
    std::fs::read(path)
        .map(|bytes| bytes.starts_with(b"%PDF-"))
        .unwrap_or(false)
}
