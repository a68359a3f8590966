// File I/O operations

pub mod csv;
pub mod text;
pub mod xlsx;

use std::path::Path;

use roster_recon::{CellValue, ReconError, Table};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Fix UTF-8 punctuation that was mis-decoded as Windows-1252
    pub repair_text: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { repair_text: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Excel,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, ReconError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(FileFormat::Csv),
            "tsv" | "tab" => Ok(FileFormat::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(FileFormat::Excel),
            _ => Err(ReconError::Io(format!(
                "{}: unsupported file type (expected .xlsx, .xls, .ods, .csv or .tsv)",
                path.display()
            ))),
        }
    }
}

/// Load every sheet of a workbook. Delimited files load as a single table
/// named after the file stem.
pub fn load_workbook(path: &Path, options: &LoadOptions) -> Result<Vec<Table>, ReconError> {
    let mut tables = match FileFormat::from_path(path)? {
        FileFormat::Csv => vec![csv::import(path)?],
        FileFormat::Tsv => vec![csv::import_tsv(path)?],
        FileFormat::Excel => xlsx::import(path)?,
    };

    if options.repair_text {
        let repaired: usize = tables.iter_mut().map(repair_table).sum();
        if repaired > 0 {
            log::info!("{}: repaired {} mis-encoded cells", path.display(), repaired);
        }
    }

    log::info!("loaded {} sheet(s) from {}", tables.len(), path.display());
    Ok(tables)
}

/// Load the first sheet of a file.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table, ReconError> {
    load_workbook(path, options)?
        .into_iter()
        .next()
        .ok_or_else(|| ReconError::Io(format!("{}: no sheets", path.display())))
}

/// Write a table, choosing the format from the extension.
pub fn save_table(table: &Table, path: &Path) -> Result<(), ReconError> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => csv::export(table, path)?,
        FileFormat::Tsv => csv::export_tsv(table, path)?,
        FileFormat::Excel => xlsx::export(table, path)?,
    }
    log::info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn repair_table(table: &mut Table) -> usize {
    let mut count = 0;
    for header in &mut table.headers {
        if let Some(fixed) = text::repair_mojibake(header) {
            *header = fixed;
            count += 1;
        }
    }
    for cell in table.rows.iter_mut().flatten().flatten() {
        if let CellValue::Text(s) = cell {
            if let Some(fixed) = text::repair_mojibake(s) {
                *s = fixed;
                count += 1;
            }
        }
    }
    count
}
