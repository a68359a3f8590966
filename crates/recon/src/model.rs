use serde::Serialize;

use crate::config::ReconConfig;
use crate::table::{CellValue, Table};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Pre-loaded source tables.
pub struct ReconInput {
    /// Every sheet of the registration workbook; one is picked by marker.
    pub registration_sheets: Vec<Table>,
    pub seating: Table,
}

/// Identity of an attendee across both sources. Values are compared by
/// their display form once both key columns are known to share one
/// representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttendeeKey {
    pub contact: String,
    pub date_of_birth: Option<String>,
}

/// One confirmed registration row.
#[derive(Debug, Clone)]
pub struct Registration {
    pub row: usize,
    pub key: AttendeeKey,
    pub contact: CellValue,
    pub date_of_birth: Option<CellValue>,
    pub first_name: Option<CellValue>,
    pub last_name: Option<CellValue>,
    pub event: Option<String>,
}

/// One seating chart row.
#[derive(Debug, Clone)]
pub struct SeatingRecord {
    pub row: usize,
    /// `None` for banquet guests.
    pub key: Option<AttendeeKey>,
    pub name: Option<String>,
    pub table: Option<CellValue>,
    pub event: Option<CellValue>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Attendee,
    Guest,
}

/// How an attendee's table was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatSource {
    Exact,
    NameFallback,
    Unseated,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterRow {
    pub kind: RowKind,
    /// Contact for attendees, display name for guests.
    pub contact: CellValue,
    pub date_of_birth: Option<CellValue>,
    pub first_name: Option<CellValue>,
    pub last_name: Option<CellValue>,
    /// Parallel to `Roster::event_columns`.
    pub events: Vec<Option<String>>,
    pub table: Option<CellValue>,
    pub seating_event: Option<CellValue>,
    pub seat_source: SeatSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterSummary {
    pub confirmed_registrations: usize,
    pub skipped_registrations: usize,
    pub attendees: usize,
    pub guests: usize,
    pub exact_matches: usize,
    pub fallback_matches: usize,
    pub unseated: usize,
    pub ambiguous_fallbacks: usize,
}

/// Consolidated attendee list, sorted by (last name, first name).
#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    pub sheet: String,
    pub event_columns: Vec<String>,
    pub rows: Vec<RosterRow>,
    pub summary: RosterSummary,
}

impl Roster {
    /// Flatten into the mail-merge table: identity columns, one column per
    /// event, then table and seating event.
    pub fn to_table(&self, config: &ReconConfig) -> Table {
        let mut headers: Vec<String> = config
            .identity_columns()
            .iter()
            .map(|h| h.to_string())
            .collect();
        headers.extend(self.event_columns.iter().cloned());
        headers.push(config.output.table_column.clone());
        headers.push(config.output.seating_event_column.clone());

        let mut table = Table::new("Roster", headers);
        for r in &self.rows {
            let mut row = Vec::with_capacity(table.width());
            row.push(Some(r.contact.clone()));
            row.push(r.date_of_birth.clone());
            row.push(r.first_name.clone());
            row.push(r.last_name.clone());
            row.extend(r.events.iter().map(|e| e.clone().map(CellValue::Text)));
            row.push(r.table.clone());
            row.push(r.seating_event.clone());
            table.rows.push(row);
        }
        table
    }
}
