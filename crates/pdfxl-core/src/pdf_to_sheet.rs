//! PDF → spreadsheet conversion
//!
//! Every page contributes rows: one per detected table row, or one per line
//! of plain text when the page has no tables.

use std::path::Path;

use lopdf::Document;
use rust_xlsxwriter::{Formula, Workbook};

use crate::error::ConvertError;
use crate::layout::PageObjects;
use crate::{ConversionReport, Row};

/// Name of the single worksheet in the generated workbook
pub const SHEET_TITLE: &str = "Extracted";

/// Per-page plain text from pdf-extract, used when a page yields no glyphs
struct FallbackText<'a> {
    bytes: &'a [u8],
    pages: Option<Vec<String>>,
}

impl<'a> FallbackText<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pages: None }
    }

    fn page(&mut self, index: usize) -> Option<&str> {
        let bytes = self.bytes;
        let pages = self.pages.get_or_insert_with(|| {
            let extracted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                pdf_extract::extract_text_from_mem_by_pages(bytes)
            }));
            match extracted {
                Ok(Ok(pages)) => pages,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "pdf-extract fallback failed");
                    Vec::new()
                }
                Err(_) => {
                    tracing::warn!("pdf-extract panicked on this document");
                    Vec::new()
                }
            }
        });
        pages.get(index).map(|text| text.trim_matches(|c| c == '\n' || c == '\r'))
    }
}

/// Rows extracted from a page
fn page_rows(objects: &PageObjects) -> Option<Vec<Row>> {
    let tables = objects.tables();
    if tables.is_empty() {
        return None;
    }

    let rows: Vec<Row> = tables
        .iter()
        .flat_map(|table| table.rows(&objects.glyphs))
        .map(|row| row.into_iter().map(Option::unwrap_or_default).collect::<Row>())
        .collect();
    Some(rows)
}

/// Extract spreadsheet rows from PDF bytes
pub fn extract_rows(bytes: &[u8]) -> Result<Vec<Row>, ConvertError> {
    let doc = Document::load_mem(bytes)?;
    Ok(document_rows(&doc, bytes))
}

fn document_rows(doc: &Document, bytes: &[u8]) -> Vec<Row> {
    let mut fallback = FallbackText::new(bytes);
    let mut rows: Vec<Row> = Vec::new();

    for (index, (page_number, page_id)) in doc.get_pages().into_iter().enumerate() {
        let objects = match PageObjects::collect(doc, page_id) {
            Ok(objects) => objects,
            Err(e) => {
                tracing::warn!(page = page_number, error = %e, "Content stream not interpretable");
                PageObjects::default()
            }
        };

        if let Some(table_rows) = page_rows(&objects) {
            tracing::debug!(page = page_number, rows = table_rows.len(), "Extracted table rows");
            rows.extend(table_rows);
            continue;
        }

        let text = if objects.glyphs.is_empty() {
            fallback.page(index).unwrap_or_default().to_string()
        } else {
            objects.text()
        };

        if !text.is_empty() {
            rows.extend(text.lines().map(|line| vec![line.to_string()]));
        }
    }

    rows
}

/// Write rows into a single-sheet workbook at `path`
pub fn write_rows(rows: &[Row], path: &Path) -> Result<(), ConvertError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_TITLE)?;
    worksheet.set_formula_result_default("");

    for (r, row) in rows.iter().enumerate() {
        let r = u32::try_from(r).unwrap_or(u32::MAX);
        for (c, value) in row.iter().enumerate() {
            let c = u16::try_from(c).unwrap_or(u16::MAX);
            if value.is_empty() {
                // a plain empty string is not stored, so blank rows would vanish
                worksheet.write_formula(r, c, Formula::new("=\"\""))?;
            } else {
                worksheet.write_string(r, c, value)?;
            }
        }
    }

    if let Err(e) = workbook.save(path) {
        // drop any partial file
        let _ = std::fs::remove_file(path);
        return Err(e.into());
    }
    Ok(())
}

/// Convert the PDF at `input` into an `.xlsx` workbook at `output`
pub fn convert_pdf_to_xlsx(input: &Path, output: &Path) -> Result<ConversionReport, ConvertError> {
    let bytes = std::fs::read(input)?;
    let doc = Document::load_mem(&bytes)?;
    let pages = doc.get_pages().len();
    let rows = document_rows(&doc, &bytes);
    write_rows(&rows, output)?;

    Ok(ConversionReport {
        pages,
        rows: rows.len(),
    })
}
