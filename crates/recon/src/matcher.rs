use std::collections::HashMap;

use crate::model::{AttendeeKey, SeatSource, SeatingRecord};
use crate::table::CellValue;

/// Lookup over the seating chart by identity key and by display name.
pub struct SeatingIndex<'a> {
    records: &'a [SeatingRecord],
    by_key: HashMap<&'a AttendeeKey, usize>,
    by_name: HashMap<&'a str, Vec<usize>>,
}

/// Table and seating event resolved for one attendee.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatAssignment {
    pub table: Option<CellValue>,
    pub event: Option<CellValue>,
    pub source: SeatSource,
    /// Distinct tables among name matches when there is more than one.
    pub ambiguous_tables: Vec<String>,
}

impl<'a> SeatingIndex<'a> {
    pub fn build(records: &'a [SeatingRecord]) -> Self {
        let mut by_key = HashMap::new();
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();

        for (i, rec) in records.iter().enumerate() {
            if let Some(ref key) = rec.key {
                // First row wins; later duplicates never multiply attendees
                by_key.entry(key).or_insert(i);
            }
            if let Some(ref name) = rec.name {
                by_name.entry(name.as_str()).or_default().push(i);
            }
        }

        Self { records, by_key, by_name }
    }

    pub fn exact(&self, key: &AttendeeKey) -> Option<&'a SeatingRecord> {
        let records = self.records;
        self.by_key.get(key).map(|&i| &records[i])
    }

    /// Every seating row whose display name equals `name`.
    pub fn by_name(&self, name: &str) -> impl Iterator<Item = &'a SeatingRecord> + '_ {
        let records = self.records;
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(move |&i| &records[i])
    }

    /// Exact identity first; the name fallback fills whatever the exact
    /// match left empty. Only text contacts can match a display name, and
    /// the first name match with a table is used.
    pub fn resolve(&self, key: &AttendeeKey, contact: &CellValue) -> SeatAssignment {
        let exact = self.exact(key);
        let fallback: Vec<&SeatingRecord> = match contact.as_text() {
            Some(name) => self.by_name(name).collect(),
            None => Vec::new(),
        };
        // Prefer a name match that actually carries a table
        let first_fallback = fallback
            .iter()
            .find(|r| r.table.is_some())
            .or(fallback.first())
            .copied();

        let exact_table = exact.and_then(|r| r.table.clone());
        let exact_event = exact.and_then(|r| r.event.clone());
        let fallback_table = first_fallback.and_then(|r| r.table.clone());
        let fallback_event = first_fallback.and_then(|r| r.event.clone());

        let source = if exact_table.is_some() {
            SeatSource::Exact
        } else if fallback_table.is_some() {
            SeatSource::NameFallback
        } else {
            SeatSource::Unseated
        };

        let mut ambiguous_tables = Vec::new();
        if source == SeatSource::NameFallback {
            for rec in &fallback {
                if let Some(ref t) = rec.table {
                    let t = t.to_string();
                    if !ambiguous_tables.contains(&t) {
                        ambiguous_tables.push(t);
                    }
                }
            }
            if ambiguous_tables.len() < 2 {
                ambiguous_tables.clear();
            }
        }

        SeatAssignment {
            table: exact_table.or(fallback_table),
            event: exact_event.or(fallback_event),
            source,
            ambiguous_tables,
        }
    }
}
