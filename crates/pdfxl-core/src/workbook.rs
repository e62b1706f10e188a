//! Spreadsheet reading via calamine

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::ConvertError;
use crate::Row;

/// A worksheet with every cell rendered as text
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

/// Render one cell the way it reads in the sheet
pub fn format_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_float(dt.as_f64()),
        },
        Data::Error(e) => e.to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Rows of a range, anchored at A1: leading empty rows and columns are kept
pub fn range_rows(range: &Range<Data>) -> Vec<Row> {
    let (Some((row0, col0)), Some((_, col_end))) = (range.start(), range.end()) else {
        return Vec::new();
    };
    let width = col_end as usize + 1;

    let mut rows: Vec<Row> = (0..row0).map(|_| vec![String::new(); width]).collect();
    for cells in range.rows() {
        let mut row = vec![String::new(); col0 as usize];
        row.extend(cells.iter().map(format_cell));
        rows.push(row);
    }
    rows
}

/// Read every worksheet of an `.xls` / `.xlsx` workbook, in workbook order
pub fn read_workbook(path: &Path) -> Result<Vec<Sheet>, ConvertError> {
    let mut workbook = open_workbook_auto(path)?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        sheets.push(Sheet {
            rows: range_rows(&range),
            name,
        });
    }
    Ok(sheets)
}
