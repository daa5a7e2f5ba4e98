//! Page-level text replacement.
//!
//! Strategies are written against three small capabilities of an editable
//! page ([`PageTextIndex`], [`RegionEraser`], [`TextReinserter`]) so that
//! they stay independent of the PDF backend and can be exercised against
//! in-memory pages in tests. [`FallbackPipeline`] runs them in order.

pub mod occurrences;
pub mod pipeline;
pub mod rebuild;
pub mod span_patch;
pub mod strategy;
pub mod watermark;

pub use occurrences::OccurrenceReplace;
pub use pipeline::FallbackPipeline;
pub use rebuild::PageRebuild;
pub use span_patch::SpanPatch;
pub use strategy::{
    FallbackOrder, ReplacementOutcome, ReplacementRequest, ReplacementStrategy, StrategyAttempt,
    StrategyId, StrategyReport, TextReplacement,
};
pub use watermark::SimpleWatermark;

use crate::domain::{Point, Rect, Rgb, TextBlock, TextSpan};
use crate::error::{PatchError, PatchResult};

/// Structured text of a page.
pub trait PageTextIndex {
    /// Blocks, lines and spans in reading order.
    fn text_blocks(&self) -> PatchResult<Vec<TextBlock>>;

    /// The first span (blocks, then lines, then spans) containing `needle`.
    fn find_first_span(&self, needle: &str) -> PatchResult<TextSpan> {
        self.text_blocks()?
            .into_iter()
            .flat_map(|block| block.lines)
            .flat_map(|line| line.spans)
            .find(|span| span.contains(needle))
            .ok_or_else(|| PatchError::TextNotFound {
                needle: needle.to_string(),
            })
    }

    /// One rectangle per occurrence of `needle`, in reading order.
    ///
    /// Occurrences are matched per line, so a needle split across spans
    /// (for example by a font change) is still found.
    fn find_all_occurrences(&self, needle: &str) -> PatchResult<Vec<Rect>> {
        let rects: Vec<Rect> = self
            .text_blocks()?
            .iter()
            .flat_map(|block| &block.lines)
            .flat_map(|line| line.occurrences(needle))
            .collect();
        if rects.is_empty() {
            return Err(PatchError::TextNotFound {
                needle: needle.to_string(),
            });
        }
        Ok(rects)
    }
}

/// How a region is blanked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseMode {
    /// Remove the content inside the region, then fill it.
    Redact,
    /// Paint an opaque rectangle over the region.
    Overlay,
}

pub trait RegionEraser {
    fn erase_with_fill(&mut self, rect: &Rect, mode: EraseMode, fill: Rgb) -> PatchResult<()>;

    /// Blanks `rect` with white.
    fn erase(&mut self, rect: &Rect, mode: EraseMode) -> PatchResult<()> {
        self.erase_with_fill(rect, mode, Rgb::WHITE)
    }
}

/// Font, size and colour for inserted text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_name: String,
    pub font_size: f32,
    pub color: Rgb,
}

pub trait TextReinserter {
    /// Draws `text` with its baseline origin at `at`.
    ///
    /// Fails with [`PatchError::FontUnavailable`] when the font cannot be
    /// resolved or cannot show every character of `text`.
    fn insert(&mut self, at: Point, text: &str, style: &TextStyle) -> PatchResult<()>;
}

/// A page a strategy can read and edit.
pub trait EditablePage: PageTextIndex + RegionEraser + TextReinserter {
    fn page_box(&self) -> Rect;

    /// Removes all existing content, leaving a blank page with the same
    /// resources and size.
    fn clear(&mut self) -> PatchResult<()>;
}
