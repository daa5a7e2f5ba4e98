//! MuPDF access to page 0: structured text, search and redaction.
//!
//! Every call opens its own MuPDF document from an in-memory copy of the
//! file and holds [`MUPDF_LOCK`] for as long as MuPDF objects are alive.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use mupdf::pdf::{PdfAnnotationType, PdfDocument as MuDocument, PdfPage as MuPage};
use mupdf::{Page, Rect as MuRect};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::domain::Rect;
use crate::error::{PatchError, PatchResult};

/// Serializes MuPDF use across threads (batch runs may be parallel).
static MUPDF_LOCK: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    // The guard protects no data, so a poisoned lock is still usable.
    MUPDF_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Page bounds and the structured-text XML MuPDF produces for page 0.
#[derive(Debug, Clone)]
pub(crate) struct PageText {
    /// Page rectangle in MuPDF page space (origin top-left, y down).
    pub bounds: Rect,
    pub xml: String,
}

pub(crate) fn first_page_text(bytes: &[u8]) -> PatchResult<PageText> {
    let _guard = lock();
    let (doc, _file) = open(bytes)?;
    let page = first_page(&doc)?;

    let bounds = page.bounds().map_err(|e| PatchError::Backend {
        backend: "MuPDF".to_string(),
        message: "Failed to get bounds for page 1".to_string(),
        source: Some(Box::new(e)),
    })?;
    let xml = page.to_xml().map_err(|e| PatchError::PdfProcessing {
        message: "Failed to extract structured text".to_string(),
        page: Some(1),
        source: Some(Box::new(e)),
    })?;

    Ok(PageText {
        bounds: Rect::new(bounds.x0, bounds.y0, bounds.x1, bounds.y1),
        xml,
    })
}

/// Bounding rectangles of MuPDF search hits for `needle` on page 0.
///
/// MuPDF matches case-insensitively and ignores paint order; callers
/// filter the hits against the visible text.
pub(crate) fn search_first_page(
    bytes: &[u8],
    needle: &str,
    max_hits: u32,
) -> PatchResult<Vec<Rect>> {
    let _guard = lock();
    let (doc, _file) = open(bytes)?;
    let page = first_page(&doc)?;

    let hits = page
        .search(needle, max_hits)
        .map_err(|e| PatchError::Backend {
            backend: "MuPDF".to_string(),
            message: format!("Search failed for pattern: {}", needle),
            source: Some(Box::new(e)),
        })?;

    let mut rects = Vec::new();
    for quad in hits {
        rects.push(Rect::new(
            quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
            quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
            quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
            quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
        ));
    }
    Ok(rects)
}

/// Applies one redaction annotation per rectangle (page space) to page 0
/// and returns the saved document.
///
/// Content under the rectangles is removed from the page, not covered.
pub(crate) fn redact_first_page(bytes: &[u8], rects: &[Rect]) -> PatchResult<Vec<u8>> {
    let _guard = lock();
    let (doc, _file) = open(bytes)?;
    let page = first_page(&doc)?;

    let mut pdf_page = match MuPage::try_from(page.clone()) {
        Ok(p) => p,
        Err(_) => return Err(PatchError::pdf("page 1 is not a PDF page", Some(1))),
    };

    for rect in rects {
        let annot = pdf_page
            .create_annotation(PdfAnnotationType::Redact)
            .map_err(|e| PatchError::PdfProcessing {
                message: "Failed to create redaction annotation".to_string(),
                page: Some(1),
                source: Some(Box::new(e)),
            })?;

        let rect = MuRect {
            x0: rect.x0,
            y0: rect.y0,
            x1: rect.x1,
            y1: rect.y1,
        };
        unsafe {
            ffi::set_annotation_rect(&annot, rect);
        }
    }

    pdf_page.redact().map_err(|e| PatchError::PdfProcessing {
        message: "Failed to apply redactions on page 1".to_string(),
        page: Some(1),
        source: Some(Box::new(e)),
    })?;
    debug!(regions = rects.len(), "applied redactions");

    let out = NamedTempFile::new()?;
    doc.save(utf8_path(out.path())?)
        .map_err(|e| PatchError::PdfProcessing {
            message: "Failed to save redacted PDF".to_string(),
            page: None,
            source: Some(Box::new(e)),
        })?;
    fs::read(out.path()).map_err(|source| PatchError::Io {
        path: out.path().to_path_buf(),
        source,
    })
}

/// Opens `bytes` with MuPDF through a temporary file, which must outlive
/// the document.
fn open(bytes: &[u8]) -> PatchResult<(MuDocument, NamedTempFile)> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;

    let doc = MuDocument::open(utf8_path(file.path())?).map_err(|e| PatchError::PdfProcessing {
        message: "Failed to open PDF with MuPDF".to_string(),
        page: None,
        source: Some(Box::new(e)),
    })?;
    Ok((doc, file))
}

fn first_page(doc: &MuDocument) -> PatchResult<Page> {
    let page_count = doc.page_count().map_err(|e| PatchError::Backend {
        backend: "MuPDF".to_string(),
        message: format!("Failed to get page count: {}", e),
        source: Some(Box::new(e)),
    })?;
    if page_count < 1 {
        return Err(PatchError::pdf("document has no pages", None));
    }

    doc.load_page(0).map_err(|e| PatchError::PdfProcessing {
        message: "Failed to load page 1".to_string(),
        page: Some(1),
        source: Some(Box::new(e)),
    })
}

fn utf8_path(path: &Path) -> PatchResult<&str> {
    path.to_str().ok_or_else(|| PatchError::Configuration {
        parameter: "path".to_string(),
        reason: format!("'{}' contains invalid UTF-8", path.display()),
    })
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// The annotation must be alive and belong to a page of an open
    /// document.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        #[repr(C)]
        struct PdfAnnotRaw {
            inner: *mut mupdf_sys::pdf_annot,
        }

        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };

            mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }
}
