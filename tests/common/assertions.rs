//! Custom assertions for patched PDFs.

use std::path::Path;

use super::pdf_helpers::{first_page_text, page_content, page_count};

/// Asserts that the visible text of page 0 contains `needle`.
///
/// # Panics
/// Panics if the text is missing or the file cannot be read.
pub fn assert_first_page_contains(pdf_path: &Path, needle: &str) {
    let text = first_page_text(pdf_path)
        .unwrap_or_else(|e| panic!("Failed to read '{}': {}", pdf_path.display(), e));
    assert!(
        text.contains(needle),
        "Expected '{}' on the first page of '{}'.\nVisible text:\n{}",
        needle,
        pdf_path.display(),
        text
    );
}

/// Asserts that the visible text of page 0 does not contain `needle`.
pub fn assert_first_page_lacks(pdf_path: &Path, needle: &str) {
    let text = first_page_text(pdf_path)
        .unwrap_or_else(|e| panic!("Failed to read '{}': {}", pdf_path.display(), e));
    assert!(
        !text.contains(needle),
        "'{}' should not be visible on the first page of '{}'.\nVisible text:\n{}",
        needle,
        pdf_path.display(),
        text
    );
}

/// Asserts that both files have the same page count and that every page
/// after the first has identical content.
pub fn assert_pages_unchanged(original: &Path, patched: &Path) {
    let count = page_count(original).expect("Failed to count original pages");
    assert_eq!(
        page_count(patched).expect("Failed to count patched pages"),
        count,
        "Page count changed"
    );
    for index in 1..count {
        assert_eq!(
            page_content(original, index).expect("Failed to read original page"),
            page_content(patched, index).expect("Failed to read patched page"),
            "Page {} content changed",
            index + 1
        );
    }
}
