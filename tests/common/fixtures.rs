//! Test fixtures and PDF builders.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use printpdf::{BuiltinFont, Mm};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// The title line used throughout the tests.
pub const TITLE: &str = "2024 KYC Report - Confidential";

/// One line of text drawn by [`TitlePageBuilder`].
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    /// `F1` = Helvetica, `F2` = Helvetica-Bold.
    pub font: &'static str,
    pub size: f32,
    pub x: f32,
    pub y: f32,
    pub rgb: [f32; 3],
}

/// Builds documents with exactly placed text using lopdf.
///
/// Resources live on the page tree root so pages inherit them.
#[derive(Debug, Clone)]
pub struct TitlePageBuilder {
    first_page: Vec<TextRun>,
    /// Raw operators appended to page 0 after the text.
    first_page_extra: Vec<Operation>,
    other_pages: Vec<String>,
}

impl TitlePageBuilder {
    pub fn new() -> Self {
        Self {
            first_page: Vec::new(),
            first_page_extra: Vec::new(),
            other_pages: Vec::new(),
        }
    }

    /// The standard scenario: a bold 14pt title at (50, 700) and a body
    /// line below it.
    pub fn kyc_title() -> Self {
        Self::new()
            .with_run(TITLE, "F2", 14.0, 50.0, 700.0)
            .with_run("Customer due diligence summary", "F1", 10.0, 50.0, 660.0)
    }

    pub fn with_run(mut self, text: &str, font: &'static str, size: f32, x: f32, y: f32) -> Self {
        self.first_page.push(TextRun {
            text: text.to_string(),
            font,
            size,
            x,
            y,
            rgb: [0.0, 0.0, 0.0],
        });
        self
    }

    pub fn with_colored_run(mut self, text: &str, x: f32, y: f32, rgb: [f32; 3]) -> Self {
        self.first_page.push(TextRun {
            text: text.to_string(),
            font: "F1",
            size: 10.0,
            x,
            y,
            rgb,
        });
        self
    }

    /// Adds a filled rectangle to page 0.
    pub fn with_box(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.first_page_extra.extend([
            Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
            Operation::new("f", vec![]),
        ]);
        self
    }

    /// Adds a page after the first one showing `text`.
    pub fn with_page(mut self, text: &str) -> Self {
        self.other_pages.push(text.to_string());
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let helvetica = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let helvetica_bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut first = Vec::new();
        for run in &self.first_page {
            first.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![run.font.into(), run.size.into()]),
                Operation::new(
                    "rg",
                    vec![run.rgb[0].into(), run.rgb[1].into(), run.rgb[2].into()],
                ),
                Operation::new("Td", vec![run.x.into(), run.y.into()]),
                Operation::new("Tj", vec![Object::string_literal(run.text.as_str())]),
                Operation::new("ET", vec![]),
            ]);
        }
        first.extend(self.first_page_extra.iter().cloned());

        let mut contents = vec![Content { operations: first }.encode()?];
        for text in &self.other_pages {
            let ops = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text.as_str())]),
                Operation::new("ET", vec![]),
            ];
            contents.push(Content { operations: ops }.encode()?);
        }

        let mut kids: Vec<Object> = Vec::new();
        for content in contents {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        "F1" => helvetica,
                        "F2" => helvetica_bold,
                    },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn build(&self, output_path: &Path) -> Result<PathBuf> {
        fs::write(output_path, self.to_bytes()?)?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TitlePageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a multi-page document with printpdf; `pages[0]` is the first
/// page's text.
pub fn create_multi_page_pdf(path: &Path, title: &str, pages: &[&str]) -> Result<PathBuf> {
    let (doc, page1, layer1) =
        printpdf::PdfDocument::new(title, Mm(210.0), Mm(297.0), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (i, text) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page, layer) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };
        layer.use_text(*text, 14.0, Mm(20.0), Mm(260.0), &font);
    }

    doc.save(&mut BufWriter::new(fs::File::create(path)?))?;
    Ok(path.to_path_buf())
}

/// A page showing "KYC Report" in Helvetica next to a Type0 font `/Foo`
/// whose ToUnicode map has a five-byte source code.
pub fn create_broken_to_unicode_pdf(path: &Path) -> Result<PathBuf> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let helvetica = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let to_unicode = doc.add_object(Stream::new(
        dictionary! {},
        b"/CIDInit /ProcSet findresource begin\n\
          12 dict begin\nbegincmap\n\
          1 begincodespacerange <0000> <FFFF> endcodespacerange\n\
          1 beginbfchar\n<0000000001> <FFFD>\nendbfchar\n\
          endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n"
            .to_vec(),
    ));
    let foo = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "Foo",
        "Encoding" => "Identity-H",
        "ToUnicode" => to_unicode,
    });

    let ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 14.into()]),
        Operation::new("Td", vec![50.into(), 700.into()]),
        Operation::new("Tj", vec![Object::string_literal("KYC Report")]),
        Operation::new("ET", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["Foo".into(), 12.into()]),
        Operation::new("Td", vec![50.into(), 600.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(vec![0, 0, 0, 0, 1], lopdf::StringFormat::Hexadecimal)],
        ),
        Operation::new("ET", vec![]),
    ];
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        Content { operations: ops }.encode()?,
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => helvetica, "Foo" => foo },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(path.to_path_buf())
}
