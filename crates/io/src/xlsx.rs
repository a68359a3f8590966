// Excel import/export (xlsx, xls, xlsb, ods in; xlsx out)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use roster_recon::{CellValue, ReconError, Table};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

/// Excel limits sheet names to 31 characters
const MAX_SHEET_NAME: usize = 31;
/// 9999-12-31
const MAX_SERIAL: f64 = 2_958_466.0;
/// Widest auto-sized column, in characters
const MAX_COLUMN_WIDTH: usize = 60;

/// Day zero of the 1900 date system as Excel counts it (serial 1 = 1900-01-01,
/// with the phantom 1900-02-29 absorbed for every date after February 1900).
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

pub(crate) fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..MAX_SERIAL).contains(&serial) {
        return None;
    }
    excel_epoch().checked_add_signed(Duration::days(serial.floor() as i64))
}

pub(crate) fn date_to_serial(date: NaiveDate) -> f64 {
    (date - excel_epoch()).num_days() as f64
}

fn convert(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::Error(e) => Some(CellValue::Text(format!("#{:?}", e))),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match serial_to_date(serial) {
                Some(date) => Some(CellValue::Date(date)),
                // Pure times have no calendar date
                None => Some(CellValue::Number(serial)),
            }
        }
        Data::DateTimeIso(s) => match s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) {
            Some(date) => Some(CellValue::Date(date)),
            None => Some(CellValue::Text(s.clone())),
        },
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

fn header_text(cell: &Data) -> String {
    match convert(cell) {
        Some(value) => value.to_string(),
        None => String::new(),
    }
}

/// Import every worksheet as a table. The first row of each sheet is its header.
pub fn import(path: &Path) -> Result<Vec<Table>, ReconError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| ReconError::Io(format!("Failed to open Excel file {}: {}", path.display(), e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(ReconError::Io(format!("{}: Excel file contains no sheets", path.display())));
    }

    let mut tables = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| ReconError::Io(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(first) => first.iter().map(header_text).collect(),
            None => Vec::new(),
        };

        let mut table = Table::new(sheet_name.as_str(), headers);
        for row in rows {
            table.push_row(row.iter().map(convert).collect())?;
        }

        log::debug!(
            "sheet '{}': {} columns, {} rows",
            sheet_name,
            table.width(),
            table.len()
        );
        tables.push(table);
    }

    Ok(tables)
}

/// Excel rejects `[]:*?/\` in sheet names, and names longer than 31 chars.
fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim().to_string();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

fn xlsx_err(e: impl std::fmt::Display) -> ReconError {
    ReconError::Io(format!("xlsx: {e}"))
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    date_format: &Format,
) -> Result<(), ReconError> {
    let written = match value {
        CellValue::Text(s) => worksheet.write_string(row, col, s.as_str()).map(|_| ()),
        CellValue::Number(n) => worksheet.write_number(row, col, *n).map(|_| ()),
        CellValue::Bool(b) => worksheet.write_boolean(row, col, *b).map(|_| ()),
        CellValue::Date(d) => worksheet
            .write_number_with_format(row, col, date_to_serial(*d), date_format)
            .map(|_| ()),
    };
    written.map_err(xlsx_err)
}

/// Export a single table as a one-sheet workbook: bold header row, frozen
/// below the header, columns sized to their widest value.
pub fn export(table: &Table, path: &Path) -> Result<(), ReconError> {
    let mut xlsx_workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let worksheet = xlsx_workbook
        .add_worksheet()
        .set_name(sheet_name(&table.name))
        .map_err(xlsx_err)?;

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header.as_str(), &header_format)
            .map_err(xlsx_err)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            let Some(value) = cell else { continue };
            write_cell(worksheet, r as u32 + 1, col as u16, value, &date_format)?;
            let len = value.to_string().chars().count();
            if let Some(w) = widths.get_mut(col) {
                *w = (*w).max(len);
            }
        }
    }

    for (col, width) in widths.iter().enumerate() {
        let width = (*width).clamp(8, MAX_COLUMN_WIDTH) + 2;
        worksheet
            .set_column_width(col as u16, width as f64)
            .map_err(xlsx_err)?;
    }
    if !table.headers.is_empty() {
        worksheet.set_freeze_panes(1, 0).map_err(xlsx_err)?;
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| ReconError::Io(format!("Failed to save XLSX file {}: {}", path.display(), e)))?;
    Ok(())
}
