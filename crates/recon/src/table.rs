// In-memory tables exchanged with the I/O layer.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A non-empty cell. Empty cells are `None` in a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

/// Representation class of a cell, used to decide whether two key columns
/// can be compared at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Number,
    Date,
    Bool,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Number => write!(f, "number"),
            Self::Date => write!(f, "date"),
            Self::Bool => write!(f, "boolean"),
        }
    }
}

impl CellValue {
    pub fn kind(&self) -> CellKind {
        match self {
            Self::Text(_) => CellKind::Text,
            Self::Number(_) => CellKind::Number,
            Self::Date(_) => CellKind::Date,
            Self::Bool(_) => CellKind::Bool,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a raw delimited-text field. Dates stay text on purpose: a CSV
    /// date and a spreadsheet date are different representations.
    ///
    /// Numerals with a leading zero ("007", "0412") stay text so member
    /// numbers and zip codes survive a round trip through a CSV roster.
    pub fn from_field(field: &str) -> Option<CellValue> {
        if field.is_empty() {
            return None;
        }
        let trimmed = field.trim();
        let unsigned = trimmed.trim_start_matches(['-', '+']);
        let zero_padded = unsigned.len() > 1
            && unsigned.starts_with('0')
            && unsigned.as_bytes()[1].is_ascii_digit();
        let numeric = !trimmed.is_empty()
            && !zero_padded
            && trimmed
                .bytes()
                .all(|b| b.is_ascii_digit() || b == b'.' || b == b'-' || b == b'+');
        if numeric {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return Some(CellValue::Number(n));
                }
            }
        }
        Some(CellValue::Text(field.to_string()))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            // Integers without decimals
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

pub type Row = Vec<Option<CellValue>>;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// One sheet: a header row plus data rows, all rows as wide as the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Same name and headers, no rows.
    pub fn empty_like(&self) -> Self {
        Self::new(self.name.clone(), self.headers.clone())
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding short rows with empty cells.
    pub fn push_row(&mut self, mut row: Row) -> Result<(), ReconError> {
        if row.len() > self.width() {
            // Trailing empties past the header are harmless
            if row[self.width()..].iter().any(|c| c.is_some()) {
                return Err(ReconError::RaggedRow {
                    table: self.name.clone(),
                    row: self.rows.len() + 2,
                    width: self.width(),
                    cells: row.len(),
                });
            }
            row.truncate(self.width());
        }
        row.resize(self.width(), None);
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, ReconError> {
        self.column_index(name).ok_or_else(|| ReconError::MissingColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    /// Strip surrounding whitespace from every header.
    pub fn trim_headers(&mut self) {
        for h in &mut self.headers {
            let trimmed = h.trim();
            if trimmed.len() != h.len() {
                *h = trimmed.to_string();
            }
        }
    }

    /// Parse delimited text. The first record is the header.
    pub fn from_csv_str(name: &str, data: &str, delimiter: u8) -> Result<Table, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ReconError::Io(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut table = Table::new(name, headers);
        for record in reader.records() {
            let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
            table.push_row(record.iter().map(CellValue::from_field).collect())?;
        }
        Ok(table)
    }
}
