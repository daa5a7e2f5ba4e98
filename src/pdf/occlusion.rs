//! Paint order of opaque fills and text on a page.
//!
//! MuPDF's structured text reports every glyph, including glyphs painted
//! over by a later filled rectangle. [`PaintOrder`] records where
//! rectangles are filled and where text is shown, in content order, so
//! covered glyphs can be left out of the text index.
//!
//! Only the operators that move the current transformation, the text
//! line origin and rectangle paths are followed; glyph advances are not.

use lopdf::content::Operation;

use super::objects::{matrix, numbers};
use crate::domain::{Matrix, Point, Rect, TextBlock, TextLine, TextSpan};

/// A baseline origin and a character origin on it match within this.
const BASELINE_TOLERANCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Painted<T> {
    seq: usize,
    item: T,
}

/// Filled rectangles and text-showing origins, in paint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PaintOrder {
    covers: Vec<Painted<Rect>>,
    shows: Vec<Painted<Point>>,
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    line: Matrix,
    leading: f32,
}

impl PaintOrder {
    /// Walks decoded content operators.
    pub(crate) fn scan(ops: &[Operation]) -> Self {
        let mut order = Self::default();
        let mut ctm = Matrix::IDENTITY;
        let mut saved: Vec<Matrix> = Vec::new();
        let mut text = TextState {
            line: Matrix::IDENTITY,
            leading: 0.0,
        };
        let mut path: Vec<Rect> = Vec::new();

        for (seq, op) in ops.iter().enumerate() {
            match op.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => ctm = saved.pop().unwrap_or(Matrix::IDENTITY),
                "cm" => {
                    if let Some(m) = matrix(&op.operands) {
                        ctm = m.then(&ctm);
                    }
                }
                "BT" => text.line = Matrix::IDENTITY,
                "Tm" => {
                    if let Some(m) = matrix(&op.operands) {
                        text.line = m;
                    }
                }
                "Td" | "TD" => {
                    if let Some([tx, ty]) = numbers(&op.operands).as_deref().and_then(pair) {
                        if op.operator == "TD" {
                            text.leading = -ty;
                        }
                        text.line = Matrix::translate(tx, ty).then(&text.line);
                    }
                }
                "TL" => {
                    if let Some([leading]) = numbers(&op.operands).as_deref().and_then(single) {
                        text.leading = leading;
                    }
                }
                "T*" => text.line = Matrix::translate(0.0, -text.leading).then(&text.line),
                "Tj" | "TJ" => order.show(seq, &text, &ctm),
                "'" | "\"" => {
                    text.line = Matrix::translate(0.0, -text.leading).then(&text.line);
                    order.show(seq, &text, &ctm);
                }
                "re" => {
                    if let Some([x, y, w, h]) = numbers(&op.operands).as_deref().and_then(quad) {
                        path.push(ctm.apply_rect(&Rect::new(x, y, x + w, y + h)));
                    }
                }
                "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                    order
                        .covers
                        .extend(path.drain(..).map(|item| Painted { seq, item }));
                }
                "n" | "S" | "s" | "m" | "l" | "c" | "v" | "y" | "h" => {
                    // Paths mixing other segments are not rectangles.
                    if op.operator != "h" {
                        path.clear();
                    }
                }
                _ => {}
            }
        }
        order
    }

    fn show(&mut self, seq: usize, text: &TextState, ctm: &Matrix) {
        let item = text.line.then(ctm).apply(Point::new(0.0, 0.0));
        self.shows.push(Painted { seq, item });
    }

    /// Maps every recorded point and rectangle, e.g. into page space.
    pub(crate) fn map(self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            covers: self
                .covers
                .into_iter()
                .filter_map(|p| {
                    let corners = [Point::new(p.item.x0, p.item.y0), Point::new(p.item.x1, p.item.y1)];
                    Rect::bounding(corners.into_iter().map(&f)).map(|item| Painted { seq: p.seq, item })
                })
                .collect(),
            shows: self
                .shows
                .into_iter()
                .map(|p| Painted {
                    seq: p.seq,
                    item: f(p.item),
                })
                .collect(),
        }
    }

    /// Whether a glyph on `baseline` starting at `x`, with box centre
    /// `center`, is painted over by a later fill.
    ///
    /// The glyph is attributed to the nearest text-showing origin on its
    /// baseline at or left of it. Glyphs that cannot be attributed are
    /// treated as visible.
    fn hides(&self, baseline: f32, x: f32, center: Point) -> bool {
        let owner = self
            .shows
            .iter()
            .filter(|s| {
                (s.item.y - baseline).abs() <= BASELINE_TOLERANCE
                    && s.item.x <= x + BASELINE_TOLERANCE
            })
            .max_by(|a, b| a.item.x.total_cmp(&b.item.x).then(a.seq.cmp(&b.seq)));
        let Some(owner) = owner else {
            return false;
        };
        self.covers
            .iter()
            .any(|c| c.seq > owner.seq && c.item.contains(center))
    }

    /// Drops covered glyphs, splitting spans around them and removing
    /// lines and blocks left empty.
    pub(crate) fn retain_visible(&self, blocks: Vec<TextBlock>) -> Vec<TextBlock> {
        if self.covers.is_empty() {
            return blocks;
        }
        blocks
            .into_iter()
            .filter_map(|block| {
                let lines: Vec<TextLine> = block
                    .lines
                    .into_iter()
                    .filter_map(|line| {
                        let spans: Vec<TextSpan> = line
                            .spans
                            .into_iter()
                            .flat_map(|span| self.visible_runs(span))
                            .collect();
                        (!spans.is_empty()).then_some(TextLine { spans })
                    })
                    .collect();
                (!lines.is_empty()).then_some(TextBlock { lines })
            })
            .collect()
    }

    fn visible_runs(&self, span: TextSpan) -> Vec<TextSpan> {
        let baseline = span.origin.y;
        let mut runs: Vec<TextSpan> = Vec::new();
        let mut current: Option<TextSpan> = None;

        for ch in &span.chars {
            if self.hides(baseline, ch.bbox.x0, ch.bbox.center()) {
                runs.extend(current.take());
                continue;
            }
            let run = current.get_or_insert_with(|| TextSpan {
                text: String::new(),
                bbox: ch.bbox,
                origin: Point::new(ch.bbox.x0, baseline),
                chars: Vec::new(),
                ..span.clone()
            });
            run.text.push(ch.ch);
            run.bbox = run.bbox.union(&ch.bbox);
            run.chars.push(ch.clone());
        }
        runs.extend(current);

        // An untouched span keeps its exact origin.
        if let [only] = runs.as_mut_slice() {
            if only.chars.len() == span.chars.len() {
                only.origin = span.origin;
            }
        }
        runs
    }
}

fn single(values: &[f32]) -> Option<[f32; 1]> {
    values.try_into().ok()
}

fn pair(values: &[f32]) -> Option<[f32; 2]> {
    values.try_into().ok()
}

fn quad(values: &[f32]) -> Option<[f32; 4]> {
    values.try_into().ok()
}
