//! The editable first page.
//!
//! A [`PdfPage`] reads page 0 through MuPDF once, when it is loaded, and
//! records edits without touching the document: redaction rectangles for
//! MuPDF, and overlay operators (covers and inserted text) for lopdf.
//! [`super::PdfDocument::commit`] applies both.
//!
//! Strategy-facing coordinates are MuPDF page space (origin top-left of the
//! crop box, y down). Overlay operators are written in PDF user space.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use tracing::debug;

use super::engine;
use super::fonts::{is_standard_font, strip_subset_prefix, PageFont};
use super::objects::{dict_get_dict, inherited, name, page_box, real, resolve};
use super::occlusion::PaintOrder;
use super::stext;
use crate::domain::{Point, Rect, Rgb, TextBlock};
use crate::error::{PatchError, PatchResult};
use crate::replacement::{
    EditablePage, EraseMode, PageTextIndex, RegionEraser, TextReinserter, TextStyle,
};

/// Prefix of resource names for fonts added to the page.
const ADDED_FONT_PREFIX: &str = "RtF";

/// Upper bound on search hits for one needle.
const MAX_HITS: u32 = 100;

/// Maps MuPDF page space onto PDF user space of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    crop: Rect,
}

impl Frame {
    fn to_pdf(self, p: Point) -> Point {
        Point::new(self.crop.x0 + p.x, self.crop.y1 - p.y)
    }

    fn to_page(self, p: Point) -> Point {
        Point::new(p.x - self.crop.x0, self.crop.y1 - p.y)
    }

    fn rect_to_pdf(self, r: &Rect) -> Rect {
        let a = self.to_pdf(Point::new(r.x0, r.y0));
        let b = self.to_pdf(Point::new(r.x1, r.y1));
        Rect::new(a.x, a.y, b.x, b.y)
    }
}

#[derive(Debug)]
pub struct PdfPage {
    pub(crate) page_id: ObjectId,
    /// The document as loaded, for searches.
    source: Vec<u8>,
    frame: Frame,
    bounds: Rect,
    /// Visible text as loaded.
    blocks: Vec<TextBlock>,
    /// Regions MuPDF removes content from, in page space.
    pub(crate) redactions: Vec<Rect>,
    /// Operators painted after the page content, in PDF space.
    pub(crate) overlay: Vec<Operation>,
    /// The page's own content is dropped on commit.
    pub(crate) cleared: bool,
    fonts: BTreeMap<String, PageFont>,
    /// Font dictionaries to add to the page resources on commit.
    pub(crate) added_fonts: Vec<(String, Dictionary)>,
}

impl PdfPage {
    pub(crate) fn load(doc: &Document, page_id: ObjectId, source: &[u8]) -> PatchResult<Self> {
        let frame = Frame {
            crop: page_box(doc, page_id)?,
        };
        let text = engine::first_page_text(source)?;
        let blocks = stext::parse(&text.xml)?;

        let decoded = doc
            .get_page_content(page_id)
            .map_err(|e| e.to_string())
            .and_then(|bytes| Content::decode(&bytes).map_err(|e| e.to_string()));
        let blocks = match decoded {
            Ok(content) => PaintOrder::scan(&content.operations)
                .map(|p| frame.to_page(p))
                .retain_visible(blocks),
            Err(reason) => {
                debug!(%reason, "content not decoded; covered text is not filtered");
                blocks
            }
        };

        let mut fonts = BTreeMap::new();
        if let Some(resources) = inherited(doc, page_id, b"Resources")? {
            let resources = resources.as_dict()?;
            if let Some(font_dict) = dict_get_dict(doc, resources, b"Font") {
                for (key, value) in font_dict.iter() {
                    if let Ok(dict) = resolve(doc, value).and_then(|o| Ok(o.as_dict()?)) {
                        let key = String::from_utf8_lossy(key).into_owned();
                        fonts.insert(key, PageFont::from_dict(doc, dict));
                    }
                }
            }
        }

        Ok(Self {
            page_id,
            source: source.to_vec(),
            frame,
            bounds: text.bounds,
            blocks,
            redactions: Vec::new(),
            overlay: Vec::new(),
            cleared: false,
            fonts,
            added_fonts: Vec::new(),
        })
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.cleared || !self.redactions.is_empty() || !self.overlay.is_empty()
    }

    /// Serialized overlay. Unless the page was cleared, it is appended
    /// after the original streams and starts by closing the `q` that
    /// opens them.
    pub(crate) fn encode_overlay(&self) -> PatchResult<Vec<u8>> {
        if self.cleared {
            return encode(self.overlay.clone());
        }
        let mut ops = vec![Operation::new("Q", vec![])];
        ops.extend_from_slice(&self.overlay);
        // Streams are concatenated when read; the base may not end in whitespace.
        let mut bytes = b"\n".to_vec();
        bytes.extend(encode(ops)?);
        Ok(bytes)
    }

    /// Picks the resource name to show `text` in `font_name`, adding a
    /// standard font to the page when no existing one can encode it.
    fn resolve_font(&mut self, font_name: &str, text: &str) -> PatchResult<(String, Vec<u8>)> {
        let wanted = strip_subset_prefix(font_name);
        for (key, font) in &self.fonts {
            if font.base_font != wanted {
                continue;
            }
            if let Some(bytes) = font.encode(text) {
                return Ok((key.clone(), bytes));
            }
        }

        if !is_standard_font(wanted) {
            return Err(PatchError::FontUnavailable {
                font: font_name.to_string(),
            });
        }

        let key = self.add_standard_font(wanted);
        let bytes = self.fonts[&key]
            .encode(text)
            .ok_or_else(|| PatchError::FontUnavailable {
                font: font_name.to_string(),
            })?;
        Ok((key, bytes))
    }

    fn add_standard_font(&mut self, base_font: &str) -> String {
        let existing = self.added_fonts.iter().find(|(key, _)| {
            self.fonts
                .get(key)
                .is_some_and(|font| font.base_font == base_font)
        });
        if let Some((key, _)) = existing {
            return key.clone();
        }

        let key = (1..)
            .map(|n| format!("{ADDED_FONT_PREFIX}{n}"))
            .find(|k| !self.fonts.contains_key(k))
            .unwrap_or_else(|| ADDED_FONT_PREFIX.to_string());
        self.added_fonts.push((
            key.clone(),
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => name(base_font),
                "Encoding" => "WinAnsiEncoding",
            },
        ));
        self.fonts.insert(key.clone(), PageFont::standard(base_font));
        debug!(font = base_font, resource = %key, "added standard font to page");
        key
    }
}

impl PageTextIndex for PdfPage {
    fn text_blocks(&self) -> PatchResult<Vec<TextBlock>> {
        Ok(self.blocks.clone())
    }

    /// MuPDF search hits that match a visible, case-exact occurrence.
    fn find_all_occurrences(&self, needle: &str) -> PatchResult<Vec<Rect>> {
        let visible: Vec<Rect> = self
            .blocks
            .iter()
            .flat_map(|block| &block.lines)
            .flat_map(|line| line.occurrences(needle))
            .collect();

        let mut rects = Vec::new();
        if !visible.is_empty() {
            rects = engine::search_first_page(&self.source, needle, MAX_HITS)?
                .into_iter()
                .filter(|hit| visible.iter().any(|v| hit.contains(v.center())))
                .collect();
        }
        if rects.is_empty() {
            return Err(PatchError::TextNotFound {
                needle: needle.to_string(),
            });
        }
        Ok(rects)
    }
}

impl RegionEraser for PdfPage {
    fn erase_with_fill(&mut self, rect: &Rect, mode: EraseMode, fill: Rgb) -> PatchResult<()> {
        if mode == EraseMode::Redact && !self.cleared {
            self.redactions.push(*rect);
        }

        let area = self.frame.rect_to_pdf(rect);
        let [r, g, b] = fill.components();
        self.overlay.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![real(r), real(g), real(b)]),
            Operation::new(
                "re",
                vec![
                    real(area.x0),
                    real(area.y0),
                    real(area.width()),
                    real(area.height()),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }
}

impl TextReinserter for PdfPage {
    fn insert(&mut self, at: Point, text: &str, style: &TextStyle) -> PatchResult<()> {
        let (key, shown) = self.resolve_font(&style.font_name, text)?;
        let origin = self.frame.to_pdf(at);
        let [r, g, b] = style.color.components();
        self.overlay.extend([
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![name(&key), real(style.font_size)]),
            Operation::new("rg", vec![real(r), real(g), real(b)]),
            Operation::new(
                "Tm",
                vec![
                    real(1.0),
                    real(0.0),
                    real(0.0),
                    real(1.0),
                    real(origin.x),
                    real(origin.y),
                ],
            ),
            Operation::new("Tj", vec![Object::String(shown, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }
}

impl EditablePage for PdfPage {
    fn page_box(&self) -> Rect {
        self.bounds
    }

    fn clear(&mut self) -> PatchResult<()> {
        self.cleared = true;
        self.redactions.clear();
        self.overlay.clear();
        Ok(())
    }
}

fn encode(operations: Vec<Operation>) -> PatchResult<Vec<u8>> {
    Content { operations }
        .encode()
        .map_err(|e| PatchError::PdfProcessing {
            message: "failed to encode content stream".to_string(),
            page: Some(1),
            source: Some(Box::new(e)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;

    fn single_page(content: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("fixture saves");
        bytes
    }

    fn page_of(content: &str) -> PdfPage {
        let bytes = single_page(content);
        let doc = Document::load_mem(&bytes).expect("parses");
        let page_id = *doc.get_pages().values().next().expect("one page");
        PdfPage::load(&doc, page_id, &bytes).expect("page loads")
    }

    const TITLE: &str = "BT /F1 14 Tf 50 700 Td (2024 KYC Report) Tj ET";

    #[test]
    fn test_frame_flips_y() {
        let frame = Frame {
            crop: Rect::new(0.0, 0.0, 612.0, 792.0),
        };
        assert_eq!(frame.to_pdf(Point::new(50.0, 100.0)), Point::new(50.0, 692.0));
        assert_eq!(frame.to_page(Point::new(50.0, 692.0)), Point::new(50.0, 100.0));
        assert_eq!(
            frame.rect_to_pdf(&Rect::new(10.0, 20.0, 30.0, 40.0)),
            Rect::new(10.0, 752.0, 30.0, 772.0)
        );
    }

    #[test]
    fn test_first_span_from_structured_text() {
        let page = page_of(TITLE);
        let span = page.find_first_span("KYC").expect("span found");
        assert_eq!(span.text, "2024 KYC Report");
        assert_eq!(span.font_name, "Helvetica-Bold");
        assert_eq!(span.font_size, 14.0);
        assert!((span.bbox.x0 - 50.0).abs() < 0.5);
        // Baseline at 700 in PDF space is 92 below the top edge.
        assert!((span.origin.y - 92.0).abs() < 0.01);
        assert_eq!(page.page_box(), Rect::new(0.0, 0.0, 612.0, 792.0));
    }

    #[test]
    fn test_covered_text_is_not_indexed() {
        let page = page_of(&format!("{TITLE} 1 1 1 rg 40 690 300 30 re f"));
        assert!(page.find_first_span("KYC").unwrap_err().is_not_found());
        assert!(page.find_all_occurrences("KYC").unwrap_err().is_not_found());
    }

    #[test]
    fn test_search_is_case_exact() {
        let page = page_of(TITLE);
        assert_eq!(page.find_all_occurrences("KYC").expect("found").len(), 1);
        assert!(page.find_all_occurrences("kyc").unwrap_err().is_not_found());
    }

    #[test]
    fn test_edits_are_recorded_in_pdf_space() {
        let mut page = page_of(TITLE);
        page.erase(&Rect::new(10.0, 20.0, 30.0, 40.0), EraseMode::Redact)
            .expect("erase");
        assert_eq!(page.redactions, [Rect::new(10.0, 20.0, 30.0, 40.0)]);
        let fill = &page.overlay[2];
        assert_eq!(fill.operator, "re");
        assert_eq!(fill.operands[1], real(752.0));

        page.erase(&Rect::new(10.0, 20.0, 30.0, 40.0), EraseMode::Overlay)
            .expect("erase");
        assert_eq!(page.redactions.len(), 1);
    }

    #[test]
    fn test_insert_reuses_page_font() {
        let mut page = page_of(TITLE);
        let style = TextStyle {
            font_name: "Helvetica-Bold".to_string(),
            font_size: 12.0,
            color: Rgb::BLUE,
        };
        page.insert(Point::new(50.0, 100.0), "PD Report", &style)
            .expect("insert");
        assert!(page.added_fonts.is_empty());
        let tf = page.overlay.iter().find(|op| op.operator == "Tf").unwrap();
        assert_eq!(tf.operands[0], name("F1"));
        let tm = page.overlay.iter().find(|op| op.operator == "Tm").unwrap();
        assert_eq!(tm.operands[5], real(692.0));
    }

    #[test]
    fn test_insert_adds_standard_font_once() {
        let mut page = page_of(TITLE);
        let style = TextStyle {
            font_name: "Times-Roman".to_string(),
            font_size: 10.0,
            color: Rgb::BLACK,
        };
        page.insert(Point::new(10.0, 10.0), "a", &style).expect("insert");
        page.insert(Point::new(10.0, 30.0), "b", &style).expect("insert");
        assert_eq!(page.added_fonts.len(), 1);
        assert_eq!(page.added_fonts[0].0, "RtF1");
    }

    #[test]
    fn test_unknown_font_is_unavailable() {
        let mut page = page_of(TITLE);
        let style = TextStyle {
            font_name: "ComicSans".to_string(),
            font_size: 10.0,
            color: Rgb::BLACK,
        };
        let err = page
            .insert(Point::new(0.0, 0.0), "x", &style)
            .unwrap_err();
        assert!(matches!(err, PatchError::FontUnavailable { .. }));
    }

    #[test]
    fn test_clear_drops_pending_edits() {
        let mut page = page_of(TITLE);
        page.erase(&Rect::new(0.0, 0.0, 10.0, 10.0), EraseMode::Redact)
            .expect("erase");
        page.clear().expect("clear");
        assert!(page.redactions.is_empty());
        assert!(page.overlay.is_empty());
        assert!(page.is_dirty());
    }
}
