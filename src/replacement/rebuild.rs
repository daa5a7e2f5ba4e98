//! Full page rebuild (`direct`, `precise`).

use tracing::debug;

use super::strategy::{ReplacementStrategy, StrategyId, StrategyReport, TextReplacement};
use super::{EditablePage, TextStyle};
use crate::domain::Point;
use crate::error::PatchResult;

/// Redraws every text span of the page onto a cleared page, with the old
/// text replaced. Spans that end up containing the new text are drawn in
/// the accent colour, the rest keep their (normalized) colour.
///
/// Only text survives: images and vector graphics of the page are dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRebuild {
    id: StrategyId,
    baseline_offset: f32,
}

impl PageRebuild {
    pub const DIRECT: PageRebuild = PageRebuild {
        id: StrategyId::Direct,
        baseline_offset: 2.0,
    };

    /// Deliberately the same rebuild as [`Self::DIRECT`]; only the id differs.
    pub const PRECISE: PageRebuild = PageRebuild {
        id: StrategyId::Precise,
        baseline_offset: 2.0,
    };
}

impl ReplacementStrategy for PageRebuild {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn apply(
        &self,
        page: &mut dyn EditablePage,
        replacement: &TextReplacement,
    ) -> PatchResult<StrategyReport> {
        page.find_first_span(&replacement.old_text)?;
        let blocks = page.text_blocks()?;
        page.clear()?;

        let mut runs = 0;
        for span in blocks
            .iter()
            .flat_map(|b| &b.lines)
            .flat_map(|l| &l.spans)
        {
            if span.text.trim().is_empty() {
                continue;
            }
            let text = span
                .text
                .replace(&replacement.old_text, &replacement.new_text);
            let color = if !replacement.new_text.is_empty() && text.contains(&replacement.new_text) {
                replacement.accent
            } else {
                span.color
            };
            let style = TextStyle {
                font_name: span.font_name.clone(),
                font_size: span.font_size,
                color,
            };
            let origin = Point::new(span.bbox.x0, span.bbox.y1 - self.baseline_offset);
            page.insert(origin, &text, &style)?;
            runs += 1;
        }
        debug!(strategy = %self.id, spans = runs, "page rebuilt");

        Ok(StrategyReport {
            regions_erased: 0,
            runs_inserted: runs,
        })
    }
}
