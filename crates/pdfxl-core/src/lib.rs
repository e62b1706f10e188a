//! PDF ⇄ spreadsheet conversion
//!
//! - `pdf_to_sheet`: tables (or plain text lines) from every PDF page into a
//!   single-sheet `.xlsx` workbook
//! - `sheet_to_pdf`: every row of every worksheet as a line of text on A4 pages
//! - `upload`: accepted file names and their sanitized on-disk form

pub mod encoding;
pub mod error;
pub mod layout;
pub mod pdf_to_sheet;
pub mod sheet_to_pdf;
pub mod upload;
pub mod workbook;

pub use error::ConvertError;
pub use pdf_to_sheet::{convert_pdf_to_xlsx, extract_rows};
pub use sheet_to_pdf::convert_xlsx_to_pdf;
pub use upload::{allowed_file, secure_filename};
pub use workbook::{read_workbook, Sheet};

/// One spreadsheet row, every cell as text
pub type Row = Vec<String>;

/// What a conversion produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    /// Pages read (PDF input) or written (PDF output)
    pub pages: usize,
    /// Rows written (spreadsheet output) or rendered (PDF output)
    pub rows: usize,
}
