//! Error types for the PDF title patcher.
//!
//! Errors are categorized by their source and carry path/page context.
//! Everything except [`PatchError::Configuration`] is absorbed at the
//! strategy boundary by the fallback pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for patching operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Error type for all patching operations.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The target text is not present on the inspected page.
    #[error("Text '{needle}' not found on page 1")]
    TextNotFound { needle: String },

    /// The requested font cannot be resolved for text insertion.
    #[error("Font '{font}' is not available for text insertion")]
    FontUnavailable { font: String },

    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document structure could not be read or edited.
    #[error("{}", pdf_message(message, *page))]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid configuration or parameters (fatal for a whole run).
    #[error("Invalid input for '{parameter}': {reason}")]
    Configuration { parameter: String, reason: String },

    /// Backend-specific error (MuPDF, lopdf, pdf-extract, std::io)
    #[error("{backend} backend error: {message}")]
    Backend {
        backend: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn pdf_message(message: &str, page: Option<usize>) -> String {
    match page {
        Some(p) => format!("PDF processing error on page {}: {}", p, message),
        None => format!("PDF processing error: {}", message),
    }
}

impl PatchError {
    /// Shorthand for a structural error without an underlying cause.
    pub fn pdf(message: impl Into<String>, page: Option<usize>) -> Self {
        Self::PdfProcessing {
            message: message.into(),
            page,
            source: None,
        }
    }

    /// Returns true when the error only means "nothing to edit here".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TextNotFound { .. })
    }
}

impl From<io::Error> for PatchError {
    fn from(err: io::Error) -> Self {
        Self::Backend {
            backend: "std::io".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<lopdf::Error> for PatchError {
    fn from(err: lopdf::Error) -> Self {
        Self::Backend {
            backend: "lopdf".to_string(),
            message: err.to_string(),
            source: None,
        }
    }
}
