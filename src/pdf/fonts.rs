//! Fonts for inserted text.
//!
//! Inserted text is shown with one-byte codes. A page font is reused when
//! it is a complete simple font whose encoding can show the text; otherwise
//! a standard 14 font is added with WinAnsiEncoding.

use lopdf::{Dictionary, Document};

use super::objects::dict_get_name;

/// The standard 14 fonts every conforming reader provides.
pub const STANDARD_FONTS: [&str; 14] = [
    "Courier",
    "Courier-Bold",
    "Courier-BoldOblique",
    "Courier-Oblique",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-BoldOblique",
    "Helvetica-Oblique",
    "Symbol",
    "Times-Bold",
    "Times-BoldItalic",
    "Times-Italic",
    "Times-Roman",
    "ZapfDingbats",
];

pub fn is_standard_font(name: &str) -> bool {
    STANDARD_FONTS.contains(&name)
}

/// Strips a subset tag such as `ABCDEF+` from a font name.
pub(crate) fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    WinAnsi,
    /// No `/Encoding`, or `StandardEncoding`: only codes that agree with
    /// WinAnsi are used.
    Standard,
    /// Anything else, including every composite font.
    Unusable,
}

/// A font as referenced by one resource name on the page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PageFont {
    /// BaseFont with any subset prefix removed.
    pub base_font: String,
    /// Subsets may lack glyphs for the new text.
    subset: bool,
    encoding: Encoding,
}

impl PageFont {
    pub(crate) fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = dict_get_name(doc, dict, b"Subtype").unwrap_or_default();
        let raw_base = dict_get_name(doc, dict, b"BaseFont").unwrap_or_default();
        let encoding = match subtype.as_str() {
            "Type1" | "MMType1" | "TrueType" => match dict_get_name(doc, dict, b"Encoding") {
                Some(name) if name == "WinAnsiEncoding" => Encoding::WinAnsi,
                Some(name) if name == "StandardEncoding" => Encoding::Standard,
                // Differences dictionaries and other named encodings.
                Some(_) => Encoding::Unusable,
                None if dict.has(b"Encoding") => Encoding::Unusable,
                None => Encoding::Standard,
            },
            _ => Encoding::Unusable,
        };

        Self {
            base_font: strip_subset_prefix(&raw_base).to_string(),
            subset: strip_subset_prefix(&raw_base).len() != raw_base.len(),
            encoding,
        }
    }

    /// A standard font as added to the page.
    pub(crate) fn standard(base_font: &str) -> Self {
        Self {
            base_font: base_font.to_string(),
            subset: false,
            encoding: Encoding::WinAnsi,
        }
    }

    /// Codes showing `text`, or `None` if this font cannot show all of it.
    pub(crate) fn encode(&self, text: &str) -> Option<Vec<u8>> {
        if self.subset {
            return None;
        }
        match self.encoding {
            Encoding::WinAnsi => text.chars().map(winansi_encode).collect(),
            Encoding::Standard => text
                .chars()
                .map(|ch| match ch {
                    '\'' | '`' => None,
                    ' '..='~' => Some(ch as u8),
                    _ => None,
                })
                .collect(),
            Encoding::Unusable => None,
        }
    }
}

/// WinAnsiEncoding 0x80..=0x9F (`\0` marks undefined codes).
const WINANSI_HIGH: [char; 32] = [
    '\u{20AC}', '\0', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\0', '\u{017D}', '\0',
    '\0', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\0', '\u{017E}', '\u{0178}',
];

pub(crate) fn winansi_encode(ch: char) -> Option<u8> {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(ch as u32 as u8),
        _ => WINANSI_HIGH
            .iter()
            .position(|c| *c == ch && *c != '\0')
            .map(|i| 0x80 + i as u8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_subset_prefix() {
        assert_eq!(strip_subset_prefix("ABCDEF+Helvetica-Bold"), "Helvetica-Bold");
        assert_eq!(strip_subset_prefix("Helvetica"), "Helvetica");
        assert_eq!(strip_subset_prefix("abc+Foo"), "abc+Foo");
    }

    #[test]
    fn test_winansi_specials() {
        assert_eq!(winansi_encode('\u{2014}'), Some(0x97));
        assert_eq!(winansi_encode('é'), Some(0xE9));
        assert_eq!(winansi_encode('\u{4E2D}'), None);
    }

    #[test]
    fn test_page_font_encodings() {
        let doc = Document::with_version("1.5");
        let winansi = PageFont::from_dict(
            &doc,
            &dictionary! {
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica-Bold",
                "Encoding" => "WinAnsiEncoding",
            },
        );
        assert_eq!(winansi.encode("PD – Report"), Some(b"PD \x96 Report".to_vec()));

        let standard = PageFont::from_dict(
            &doc,
            &dictionary! { "Subtype" => "Type1", "BaseFont" => "Times-Roman" },
        );
        assert_eq!(standard.encode("PD Report"), Some(b"PD Report".to_vec()));
        assert_eq!(standard.encode("it's"), None);
    }

    #[test]
    fn test_subsets_and_composites_are_not_reused() {
        let doc = Document::with_version("1.5");
        let subset = PageFont::from_dict(
            &doc,
            &dictionary! {
                "Subtype" => "TrueType",
                "BaseFont" => "ABCDEF+ArialMT",
                "Encoding" => "WinAnsiEncoding",
            },
        );
        assert_eq!(subset.base_font, "ArialMT");
        assert_eq!(subset.encode("PD"), None);

        let composite = PageFont::from_dict(
            &doc,
            &dictionary! {
                "Subtype" => "Type0",
                "BaseFont" => "NotoSans",
                "Encoding" => "Identity-H",
            },
        );
        assert_eq!(composite.encode("PD"), None);
        assert_eq!(PageFont::standard("Courier").encode("PD"), Some(b"PD".to_vec()));
    }
}
