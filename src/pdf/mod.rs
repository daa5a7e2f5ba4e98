//! PDF document access.
//!
//! Reading, searching and redacting page 0 go through MuPDF; appending
//! covers and inserted text goes through lopdf. [`PdfDocument`] owns one
//! loaded document. The first page is handed out as a detached
//! [`PdfPage`] that strategies edit through the [`crate::replacement`]
//! capabilities; [`PdfDocument::commit`] writes it back and leaves every
//! other page's content untouched.

mod engine;
pub mod fonts;
mod objects;
mod occlusion;
mod page;
mod stext;

pub use fonts::{is_standard_font, STANDARD_FONTS};
pub use page::PdfPage;

use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::domain::blocks_to_text;
use crate::error::{PatchError, PatchResult};
use crate::replacement::PageTextIndex;
use objects::{dict_get_dict, inherited};

/// A PDF document loaded into memory.
#[derive(Debug)]
pub struct PdfDocument {
    doc: Document,
    /// The bytes `doc` was parsed from.
    source: Vec<u8>,
}

impl PdfDocument {
    /// Parses a document from bytes.
    pub fn from_bytes(bytes: &[u8]) -> PatchResult<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| PatchError::PdfProcessing {
            message: "failed to parse PDF".to_string(),
            page: None,
            source: Some(Box::new(e)),
        })?;
        Ok(Self {
            doc,
            source: bytes.to_vec(),
        })
    }

    /// Reads and parses the document at `path`.
    pub fn open(path: &Path) -> PatchResult<Self> {
        let bytes = fs::read(path).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn first_page_id(&self) -> PatchResult<ObjectId> {
        self.doc
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or_else(|| PatchError::pdf("document has no pages", None))
    }

    /// Loads page 0 for editing.
    pub fn first_page(&self) -> PatchResult<PdfPage> {
        PdfPage::load(&self.doc, self.first_page_id()?, &self.source)
    }

    /// Visible text of page 0, one line per text line.
    pub fn first_page_text(&self) -> PatchResult<String> {
        Ok(blocks_to_text(&self.first_page()?.text_blocks()?))
    }

    /// Decoded content of the page at `index` (0-based).
    pub fn page_content(&self, index: usize) -> PatchResult<Vec<u8>> {
        let page_id = self
            .doc
            .get_pages()
            .values()
            .nth(index)
            .copied()
            .ok_or_else(|| PatchError::pdf(format!("no page at index {index}"), None))?;
        Ok(self.doc.get_page_content(page_id)?)
    }

    /// Writes an edited page back into the document.
    ///
    /// Pending redactions are applied by MuPDF first and the document is
    /// reloaded from its output. The overlay is then added with lopdf:
    /// after the page's existing streams, bracketed by two new streams, or
    /// as the only stream of a cleared page.
    pub fn commit(&mut self, page: PdfPage) -> PatchResult<()> {
        if !page.is_dirty() {
            return Ok(());
        }

        let mut page_id = page.page_id;
        if !page.redactions.is_empty() {
            let redacted = engine::redact_first_page(&self.source, &page.redactions)?;
            *self = Self::from_bytes(&redacted)?;
            page_id = self.first_page_id()?;
        }

        let overlay = self.add_stream(page.encode_overlay()?);
        let contents: Vec<Object> = if page.cleared {
            vec![Object::Reference(overlay)]
        } else {
            let mut refs = vec![Object::Reference(self.add_stream(b"q\n".to_vec()))];
            refs.extend(self.content_refs(page_id)?);
            refs.push(Object::Reference(overlay));
            refs
        };

        let resources = if page.added_fonts.is_empty() {
            None
        } else {
            Some(self.resources_with(page_id, page.added_fonts)?)
        };

        let dict = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)?;
        dict.set("Contents", Object::Array(contents));
        if let Some(resources) = resources {
            dict.set("Resources", Object::Dictionary(resources));
        }
        Ok(())
    }

    /// A copy of the page's resources, inherited ones included, with an
    /// inline font dictionary extended by `fonts`.
    fn resources_with(
        &self,
        page_id: ObjectId,
        fonts: Vec<(String, Dictionary)>,
    ) -> PatchResult<Dictionary> {
        let mut resources = match inherited(&self.doc, page_id, b"Resources")? {
            Some(obj) => obj.as_dict()?.clone(),
            None => Dictionary::new(),
        };
        let mut font_dict = dict_get_dict(&self.doc, &resources, b"Font")
            .cloned()
            .unwrap_or_else(Dictionary::new);
        for (key, font) in fonts {
            font_dict.set(key.into_bytes(), Object::Dictionary(font));
        }
        resources.set("Font", Object::Dictionary(font_dict));
        Ok(resources)
    }

    fn add_stream(&mut self, content: Vec<u8>) -> ObjectId {
        self.doc.add_object(Stream::new(Dictionary::new(), content))
    }

    /// Existing content stream references of a page, in order.
    fn content_refs(&self, page_id: ObjectId) -> PatchResult<Vec<Object>> {
        let page = self.doc.get_object(page_id)?.as_dict()?;
        let refs = match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id)? {
                Object::Array(items) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Stream(_)) => {
                return Err(PatchError::pdf("inline content stream on page", Some(1)))
            }
            _ => Vec::new(),
        };
        Ok(refs)
    }

    /// Serializes the document.
    pub fn to_bytes(&mut self) -> PatchResult<Vec<u8>> {
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| PatchError::PdfProcessing {
                message: "failed to serialize document".to_string(),
                page: None,
                source: Some(Box::new(e)),
            })?;
        Ok(out)
    }
}
