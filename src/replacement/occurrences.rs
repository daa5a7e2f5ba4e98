//! Per-occurrence replacement (`standard`).

use tracing::debug;

use super::strategy::{ReplacementStrategy, StrategyId, StrategyReport, TextReplacement};
use super::{EditablePage, EraseMode, TextStyle};
use crate::domain::{Point, Rect, TextSpan};
use crate::error::PatchResult;

/// Redacts every occurrence of the old text and draws the new text in its
/// place. Font and size come from the span the occurrence starts in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OccurrenceReplace;

/// Baseline height above the bottom edge of the occurrence box.
const BASELINE_OFFSET: f32 = 2.0;

impl ReplacementStrategy for OccurrenceReplace {
    fn id(&self) -> StrategyId {
        StrategyId::Standard
    }

    fn apply(
        &self,
        page: &mut dyn EditablePage,
        replacement: &TextReplacement,
    ) -> PatchResult<StrategyReport> {
        let rects = page.find_all_occurrences(&replacement.old_text)?;
        let spans: Vec<TextSpan> = page
            .text_blocks()?
            .into_iter()
            .flat_map(|b| b.lines)
            .flat_map(|l| l.spans)
            .collect();
        debug!(occurrences = rects.len(), "found occurrences");

        // Styles are read before any edit changes the page.
        let styled: Vec<(Rect, TextStyle)> = rects
            .into_iter()
            .map(|rect| {
                let source = spans
                    .iter()
                    .find(|s| s.chars.iter().any(|c| c.bbox.x0 == rect.x0 && c.bbox.y0 == rect.y0))
                    .or_else(|| spans.iter().find(|s| s.bbox.contains(rect.center())));
                let style = TextStyle {
                    font_name: source
                        .map(|s| s.font_name.clone())
                        .unwrap_or_else(|| "Helvetica".to_string()),
                    font_size: source.map_or(rect.height(), |s| s.font_size),
                    color: replacement.accent,
                };
                (rect, style)
            })
            .collect();

        for (rect, style) in &styled {
            page.erase(rect, EraseMode::Redact)?;
            page.insert(
                Point::new(rect.x0, rect.y1 - BASELINE_OFFSET),
                &replacement.new_text,
                style,
            )?;
        }

        Ok(StrategyReport {
            regions_erased: styled.len(),
            runs_inserted: styled.len(),
        })
    }
}
