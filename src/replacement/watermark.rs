//! The unconditional `simple` fallback.

use tracing::debug;

use super::strategy::{ReplacementStrategy, StrategyId, StrategyReport, TextReplacement};
use super::{EditablePage, TextStyle};
use crate::domain::{Point, Rgb};
use crate::error::PatchResult;

/// Draws a fixed label at a fixed position near the top-left corner of the
/// page. It never looks for the old text, so it succeeds whether or not
/// that text is present.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleWatermark {
    pub text: String,
    pub style: TextStyle,
    /// Distance of the baseline origin from the left edge of the page.
    pub left: f32,
    /// Distance of the baseline origin below the top edge of the page.
    pub below_top: f32,
}

impl SimpleWatermark {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

impl Default for SimpleWatermark {
    fn default() -> Self {
        Self {
            text: "PD Report".to_string(),
            style: TextStyle {
                font_name: "Helvetica-Bold".to_string(),
                font_size: 24.0,
                color: Rgb::BLUE,
            },
            left: 50.0,
            below_top: 100.0,
        }
    }
}

impl ReplacementStrategy for SimpleWatermark {
    fn id(&self) -> StrategyId {
        StrategyId::Simple
    }

    fn apply(
        &self,
        page: &mut dyn EditablePage,
        _replacement: &TextReplacement,
    ) -> PatchResult<StrategyReport> {
        let page_box = page.page_box();
        let origin = Point::new(page_box.x0 + self.left, page_box.y0 + self.below_top);
        page.insert(origin, &self.text, &self.style)?;
        debug!(x = origin.x, y = origin.y, "watermark drawn");
        Ok(StrategyReport {
            regions_erased: 0,
            runs_inserted: 1,
        })
    }
}
