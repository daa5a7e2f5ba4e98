//! Structured page text: blocks → lines → spans → characters.

use super::color::Rgb;
use super::geometry::{Point, Rect};

/// One character with its page-space box.
#[derive(Debug, Clone, PartialEq)]
pub struct CharBox {
    pub ch: char,
    pub bbox: Rect,
}

/// A run of text sharing one font, size and colour.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Font name with any subset prefix (`ABCDEF+`) removed.
    pub font_name: String,
    /// Effective size in page units.
    pub font_size: f32,
    pub bbox: Rect,
    pub color: Rgb,
    /// Baseline origin of the first glyph.
    pub origin: Point,
    /// Per-character boxes, `chars.len() == text.chars().count()`.
    pub chars: Vec<CharBox>,
}

impl TextSpan {
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }
}

/// Spans sharing a baseline, in reading order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn bbox(&self) -> Option<Rect> {
        self.spans
            .iter()
            .map(|s| s.bbox)
            .reduce(|acc, r| acc.union(&r))
    }

    /// Rectangles of every non-overlapping occurrence of `needle`.
    ///
    /// Matching runs over the whole line, so an occurrence may straddle
    /// spans; its rectangle covers only the matched characters.
    pub fn occurrences(&self, needle: &str) -> Vec<Rect> {
        let needle: Vec<char> = needle.chars().collect();
        let chars: Vec<&CharBox> = self.spans.iter().flat_map(|s| s.chars.iter()).collect();
        let mut found = Vec::new();
        if needle.is_empty() || chars.len() < needle.len() {
            return found;
        }

        let mut i = 0;
        while i + needle.len() <= chars.len() {
            let window = &chars[i..i + needle.len()];
            if window.iter().zip(&needle).all(|(c, n)| c.ch == *n) {
                if let Some(rect) = window.iter().map(|c| c.bbox).reduce(|a, b| a.union(&b)) {
                    found.push(rect);
                }
                i += needle.len();
            } else {
                i += 1;
            }
        }
        found
    }
}

/// A group of lines produced by one text object on the page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

/// Concatenates block text with one line per row, blocks separated by a
/// blank line.
pub fn blocks_to_text(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|b| {
            b.lines
                .iter()
                .map(TextLine::text)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
