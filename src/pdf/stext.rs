//! Reads MuPDF's structured-text XML into blocks, lines and spans.
//!
//! The XML nests `<block>` → `<line>` → `<font name size>` → `<char>`,
//! each char carrying its quad, baseline origin, colour and text. Within a
//! line, consecutive chars sharing font, size and colour form one span.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::fonts::strip_subset_prefix;
use crate::domain::{CharBox, Point, Rect, Rgb, TextBlock, TextLine, TextSpan};
use crate::error::{PatchError, PatchResult};

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)(block|line|font|span|char)\b([^>]*)>").expect("Valid regex")
});

static ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_]+)="([^"]*)""#).expect("Valid regex"));

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("Valid regex")
});

/// Parses the XML of one page.
pub(crate) fn parse(xml: &str) -> PatchResult<Vec<TextBlock>> {
    let mut reader = Reader::default();
    for caps in TAG.captures_iter(xml) {
        let closing = !caps[1].is_empty();
        let attrs = &caps[3];
        match (&caps[2], closing) {
            ("block", false) => reader.open_block(),
            ("block", true) => reader.close_block(),
            ("line", false) => reader.open_line(),
            ("line", true) => reader.close_line(),
            ("font" | "span", false) => reader.set_font(attrs)?,
            ("char", false) => reader.push_char(attrs)?,
            _ => {}
        }
    }
    reader.close_block();
    Ok(reader.blocks)
}

#[derive(Debug, Default)]
struct Reader {
    blocks: Vec<TextBlock>,
    block: Option<TextBlock>,
    line: Option<TextLine>,
    span: Option<TextSpan>,
    font_name: String,
    font_size: f32,
}

impl Reader {
    fn open_block(&mut self) {
        self.close_block();
        self.block = Some(TextBlock::default());
    }

    fn close_block(&mut self) {
        self.close_line();
        if let Some(block) = self.block.take() {
            if !block.lines.is_empty() {
                self.blocks.push(block);
            }
        }
    }

    fn open_line(&mut self) {
        self.close_line();
        self.line = Some(TextLine::default());
    }

    fn close_line(&mut self) {
        self.close_span();
        if let Some(line) = self.line.take() {
            if !line.spans.is_empty() {
                self.block.get_or_insert_with(TextBlock::default).lines.push(line);
            }
        }
    }

    fn close_span(&mut self) {
        if let (Some(span), Some(line)) = (self.span.take(), self.line.as_mut()) {
            line.spans.push(span);
        }
    }

    fn set_font(&mut self, attrs: &str) -> PatchResult<()> {
        let name = attr(attrs, "name")
            .or_else(|| attr(attrs, "font"))
            .unwrap_or_default();
        self.font_name = strip_subset_prefix(&unescape(&name)).to_string();
        self.font_size = match attr(attrs, "size") {
            Some(size) => number(&size)?,
            None => 0.0,
        };
        Ok(())
    }

    fn push_char(&mut self, attrs: &str) -> PatchResult<()> {
        if self.line.is_none() {
            return Err(PatchError::pdf("structured text has a char outside a line", Some(1)));
        }

        let Some(ch) = attr(attrs, "c").and_then(|c| unescape(&c).chars().next()) else {
            return Ok(());
        };
        let bbox = match (attr(attrs, "quad"), attr(attrs, "bbox")) {
            (Some(quad), _) => bounding(&quad)?,
            (None, Some(bbox)) => bounding(&bbox)?,
            (None, None) => return Err(PatchError::pdf("structured text char has no box", Some(1))),
        };
        let origin = match (attr(attrs, "x"), attr(attrs, "y")) {
            (Some(x), Some(y)) => Point::new(number(&x)?, number(&y)?),
            _ => Point::new(bbox.x0, bbox.y1),
        };
        let color = match attr(attrs, "color") {
            Some(hex) => Rgb::from_hex(&hex).unwrap_or_default(),
            None => Rgb::BLACK,
        };

        let continues = self.span.as_ref().is_some_and(|span| {
            span.font_name == self.font_name && span.font_size == self.font_size && span.color == color
        });
        if !continues {
            self.close_span();
            self.span = Some(TextSpan {
                text: String::new(),
                font_name: self.font_name.clone(),
                font_size: self.font_size,
                bbox,
                color,
                origin,
                chars: Vec::new(),
            });
        }
        if let Some(span) = self.span.as_mut() {
            span.text.push(ch);
            span.bbox = span.bbox.union(&bbox);
            span.chars.push(CharBox { ch, bbox });
        }
        Ok(())
    }
}

fn attr(attrs: &str, key: &str) -> Option<String> {
    ATTR.captures_iter(attrs)
        .find(|caps| &caps[1] == key)
        .map(|caps| caps[2].to_string())
}

fn number(value: &str) -> PatchResult<f32> {
    value
        .trim()
        .parse()
        .map_err(|_| PatchError::pdf(format!("bad number '{}' in structured text", value), Some(1)))
}

/// Bounding box of a list of `x y` pairs (a quad or a plain bbox).
fn bounding(values: &str) -> PatchResult<Rect> {
    let numbers = values
        .split_whitespace()
        .map(number)
        .collect::<PatchResult<Vec<f32>>>()?;
    if numbers.len() < 4 || numbers.len() % 2 != 0 {
        return Err(PatchError::pdf(format!("bad box '{}' in structured text", values), Some(1)));
    }
    Rect::bounding(numbers.chunks(2).map(|p| Point::new(p[0], p[1])))
        .ok_or_else(|| PatchError::pdf("empty box in structured text", Some(1)))
}

fn unescape(value: &str) -> String {
    ENTITY
        .replace_all(value, |caps: &Captures| match &caps[1] {
            "amp" => "&".to_string(),
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "quot" => "\"".to_string(),
            "apos" => "'".to_string(),
            code => {
                let parsed = match code.strip_prefix("#x") {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => code[1..].parse().ok(),
                };
                parsed
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
                    .to_string()
            }
        })
        .into_owned()
}
