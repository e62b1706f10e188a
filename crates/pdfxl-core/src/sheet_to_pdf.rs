//! Spreadsheet → PDF rendering
//!
//! Each sheet starts on a fresh A4 page with a bold `Sheet: <name>` header,
//! followed by one line of text per row.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::encoding::encode_lossy;
use crate::error::ConvertError;
use crate::workbook::{read_workbook, Sheet};
use crate::ConversionReport;

/// A4 in points
pub const PAGE_WIDTH: f64 = 595.2756;
pub const PAGE_HEIGHT: f64 = 841.8898;

pub const MARGIN: f64 = 40.0;
pub const HEADER_FONT_SIZE: f64 = 12.0;
pub const BODY_FONT_SIZE: f64 = 9.0;
pub const HEADER_ADVANCE: f64 = 18.0;
pub const LINE_ADVANCE: f64 = 12.0;

/// Rows are cut to this many characters
pub const MAX_LINE_CHARS: usize = 1200;

pub const CELL_SEPARATOR: &str = " | ";

/// Below this baseline a new page is started
pub const BOTTOM_LIMIT: f64 = MARGIN + 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

impl FontStyle {
    fn resource_name(self) -> &'static [u8] {
        match self {
            FontStyle::Regular => b"F1",
            FontStyle::Bold => b"F2",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub style: FontStyle,
    pub size: f64,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<TextLine>,
}

/// Text of one row: cells joined by the separator, truncated
pub fn row_text(row: &[String]) -> String {
    row.join(CELL_SEPARATOR).chars().take(MAX_LINE_CHARS).collect()
}

/// Place every sheet header and row on A4 pages
pub fn layout_sheets(sheets: &[Sheet]) -> Vec<PageLayout> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut pages = Vec::new();
    let mut current = PageLayout::default();
    let mut y = top;

    for sheet in sheets {
        current.lines.push(TextLine {
            style: FontStyle::Bold,
            size: HEADER_FONT_SIZE,
            x: MARGIN,
            y,
            text: format!("Sheet: {}", sheet.name),
        });
        y -= HEADER_ADVANCE;

        for row in &sheet.rows {
            if y < BOTTOM_LIMIT {
                pages.push(std::mem::take(&mut current));
                y = top;
            }
            current.lines.push(TextLine {
                style: FontStyle::Regular,
                size: BODY_FONT_SIZE,
                x: MARGIN,
                y,
                text: row_text(row),
            });
            y -= LINE_ADVANCE;
        }

        pages.push(std::mem::take(&mut current));
        y = top;
    }

    if pages.is_empty() {
        pages.push(PageLayout::default());
    }
    pages
}

fn real(value: f64) -> Object {
    Object::Real(value as _)
}

fn page_content(page: &PageLayout) -> Content {
    let mut operations = Vec::with_capacity(page.lines.len() * 5);
    for line in &page.lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(line.style.resource_name().to_vec()),
                real(line.size),
            ],
        ));
        operations.push(Operation::new("Td", vec![real(line.x), real(line.y)]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encode_lossy(&line.text), StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

/// Serialize laid-out pages into a PDF using the standard Helvetica fonts
pub fn render_pdf(pages: &[PageLayout]) -> Result<Vec<u8>, ConvertError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = page_content(page)
            .encode()
            .map_err(|e| ConvertError::Render(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ConvertError::Render(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}

/// Convert the workbook at `input` into a PDF at `output`
pub fn convert_xlsx_to_pdf(input: &Path, output: &Path) -> Result<ConversionReport, ConvertError> {
    let sheets = read_workbook(input)?;
    let pages = layout_sheets(&sheets);
    let bytes = render_pdf(&pages)?;
    std::fs::write(output, bytes)?;

    Ok(ConversionReport {
        pages: pages.len(),
        rows: sheets.iter().map(|s| s.rows.len()).sum(),
    })
}
