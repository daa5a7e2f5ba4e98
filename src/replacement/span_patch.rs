//! In-place replacement of the first matching span (`clean`, `minimal`,
//! `overlay`).

use tracing::debug;

use super::strategy::{ReplacementStrategy, StrategyId, StrategyReport, TextReplacement};
use super::{EditablePage, EraseMode, TextStyle};
use crate::domain::Point;
use crate::error::PatchResult;

/// Blanks the first span containing the old text and redraws the span's
/// text, with the old text replaced, in the accent colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanPatch {
    id: StrategyId,
    mode: EraseMode,
    /// Grown on every side of the span box before erasing.
    margin: f32,
    /// Baseline height above the bottom edge of the span box.
    baseline_offset: f32,
}

impl SpanPatch {
    /// Opaque cover over the span grown by 3 units.
    pub const CLEAN: SpanPatch = SpanPatch {
        id: StrategyId::Clean,
        mode: EraseMode::Overlay,
        margin: 3.0,
        baseline_offset: 5.0,
    };

    /// Redaction of the span grown by 2 units.
    pub const MINIMAL: SpanPatch = SpanPatch {
        id: StrategyId::Minimal,
        mode: EraseMode::Redact,
        margin: 2.0,
        baseline_offset: 2.0,
    };

    /// Redaction of exactly the span box.
    pub const OVERLAY: SpanPatch = SpanPatch {
        id: StrategyId::Overlay,
        mode: EraseMode::Redact,
        margin: 0.0,
        baseline_offset: 2.0,
    };

    pub fn mode(&self) -> EraseMode {
        self.mode
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }
}

impl ReplacementStrategy for SpanPatch {
    fn id(&self) -> StrategyId {
        self.id
    }

    fn apply(
        &self,
        page: &mut dyn EditablePage,
        replacement: &TextReplacement,
    ) -> PatchResult<StrategyReport> {
        let span = page.find_first_span(&replacement.old_text)?;
        debug!(
            strategy = %self.id,
            font = %span.font_name,
            size = span.font_size,
            "found target span"
        );

        page.erase(&span.bbox.expand(self.margin), self.mode)?;

        let text = span
            .text
            .replace(&replacement.old_text, &replacement.new_text);
        let style = TextStyle {
            font_name: span.font_name.clone(),
            font_size: span.font_size,
            color: replacement.accent,
        };
        let origin = Point::new(span.bbox.x0, span.bbox.y1 - self.baseline_offset);
        page.insert(origin, &text, &style)?;

        Ok(StrategyReport {
            regions_erased: 1,
            runs_inserted: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text::test_support::span;
    use crate::domain::{Rect, Rgb};
    use crate::replacement::test_support::MemoryPage;

    fn replacement() -> TextReplacement {
        TextReplacement {
            old_text: "KYC Report".to_string(),
            new_text: "PD Report".to_string(),
            accent: Rgb::new(0.0, 0.4, 0.8),
        }
    }

    fn title_page() -> MemoryPage {
        MemoryPage::with_lines(vec![
            vec![span("Customer file", 50.0, 40.0, 10.0)],
            vec![span("2024 KYC Report - Confidential", 50.0, 80.0, 14.0)],
        ])
    }

    #[test]
    fn test_clean_covers_grown_box_and_redraws_line() {
        let mut page = title_page();
        SpanPatch::CLEAN
            .apply(&mut page, &replacement())
            .expect("applies");

        let erases = page.erases();
        assert_eq!(erases.len(), 1);
        assert_eq!(erases[0].1, EraseMode::Overlay);
        assert_eq!(erases[0].0, Rect::new(47.0, 77.0, 263.0, 97.0));

        let inserts = page.inserts();
        assert_eq!(inserts.len(), 1);
        let (at, text, style) = &inserts[0];
        assert_eq!(text, "2024 PD Report - Confidential");
        assert_eq!(*at, Point::new(50.0, 89.0));
        assert_eq!(style.font_size, 14.0);
        assert_eq!(style.color, Rgb::new(0.0, 0.4, 0.8));
    }

    #[test]
    fn test_minimal_and_overlay_redact() {
        for (strategy, grown) in [(SpanPatch::MINIMAL, 2.0), (SpanPatch::OVERLAY, 0.0)] {
            let mut page = title_page();
            strategy.apply(&mut page, &replacement()).expect("applies");
            let (rect, mode) = page.erases()[0];
            assert_eq!(mode, EraseMode::Redact);
            assert_eq!(rect.x0, 50.0 - grown);
            assert_eq!(page.inserts()[0].0, Point::new(50.0, 92.0));
        }
    }

    #[test]
    fn test_missing_text_leaves_page_alone() {
        let mut page = MemoryPage::with_lines(vec![vec![span("PD Report", 50.0, 700.0, 14.0)]]);
        let err = SpanPatch::CLEAN
            .apply(&mut page, &replacement())
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(page.edits.is_empty());
    }

    #[test]
    fn test_font_failure_is_an_error() {
        let mut page = title_page();
        page.missing_fonts.push("Helvetica".to_string());
        assert!(SpanPatch::MINIMAL.apply(&mut page, &replacement()).is_err());
    }
}
