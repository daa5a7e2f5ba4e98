//! Batch PDF title patching.
//!
//! Replaces a literal string (by default `"KYC Report"`) on the first page
//! of PDF documents with another (`"PD Report"`), keeping the surrounding
//! layout, and writes the patched documents to an output directory.
//!
//! # Features
//!
//! - **Six replacement methods**: in-place span patches with an opaque
//!   cover or a MuPDF redaction, per-occurrence redaction, and full page
//!   rebuilds
//! - **Fallback chain**: methods are tried in order on a fresh copy of the
//!   document until one succeeds, ending in an unconditional watermark
//! - **Visible text index**: text hidden under an opaque fill is not
//!   reported, so patched files are not patched twice
//! - **Atomic output**: nothing is written for a file until a method has
//!   fully succeeded
//!
//! # Architecture
//!
//! - [`domain`]: geometry, colours and structured page text
//! - [`pdf`]: MuPDF for structured text, search and redaction; lopdf for
//!   appended covers and inserted text
//! - [`replacement`]: page capabilities, methods and the fallback pipeline
//! - [`batch`]: directory scanning and tallying
//! - [`error`]: error handling
//!
//! # Quick Start
//!
//! ```no_run
//! use retitle::{FallbackOrder, FallbackPipeline, ReplacementConfig, ReplacementRequest};
//! use std::path::PathBuf;
//!
//! let config = ReplacementConfig::default();
//! let request = ReplacementRequest {
//!     source_path: PathBuf::from("in/report.pdf"),
//!     destination_path: PathBuf::from("out/report.pdf"),
//!     replacement: config.replacement(),
//! };
//!
//! let outcome = FallbackPipeline::new().run(
//!     &request,
//!     &FallbackOrder::default(),
//!     &config.watermark,
//! );
//! println!("{:?} via {:?}", outcome.succeeded, outcome.strategy_used);
//! ```
//!
//! ## Whole directory
//!
//! ```no_run
//! use retitle::{BatchRunner, FallbackOrder, FallbackPipeline, ReplacementConfig};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = BatchRunner::new(
//!     FallbackPipeline::new(),
//!     ReplacementConfig::default(),
//!     FallbackOrder::default(),
//! );
//! let summary = runner.run(Path::new("in"), Path::new("in/processed"))?;
//! println!("{} successful, {} failed", summary.succeeded, summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod domain;
pub mod error;
pub mod pdf;
pub mod replacement;

use std::path::Path;

pub use batch::{find_pdf_files, BatchRunner, BatchSummary};
pub use config::ReplacementConfig;
pub use domain::{normalize_color, ColorValue, Point, Rect, Rgb, TextSpan};
pub use error::{PatchError, PatchResult};
pub use pdf::{PdfDocument, PdfPage};
pub use replacement::{
    EditablePage, EraseMode, FallbackOrder, FallbackPipeline, PageTextIndex, RegionEraser,
    ReplacementOutcome, ReplacementRequest, ReplacementStrategy, SimpleWatermark,
    StrategyAttempt, StrategyId, StrategyReport, TextReinserter, TextReplacement, TextStyle,
};

/// Text of the whole document as pdf-extract reads it.
pub fn extract_text_from_pdf(input: &Path) -> PatchResult<String> {
    let bytes = std::fs::read(input).map_err(|source| PatchError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| PatchError::Backend {
        backend: "pdf-extract".to_string(),
        message: format!("failed to extract text from {}: {}", input.display(), e),
        source: None,
    })
}

/// Visible text of page 0, one line per text line.
pub fn first_page_text(input: &Path) -> PatchResult<String> {
    PdfDocument::open(input)?.first_page_text()
}
