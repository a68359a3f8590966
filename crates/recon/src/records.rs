// Typed extraction of registration and seating rows, with key checks.

use crate::config::{RegistrationSource, SeatingColumns};
use crate::error::ReconError;
use crate::model::{AttendeeKey, Registration, SeatingRecord};
use crate::table::{CellKind, CellValue, Table};

/// Tracks the representation of one logical key column across tables.
pub struct KeyKind {
    column: String,
    seen: Option<(CellKind, String)>,
}

impl KeyKind {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            seen: None,
        }
    }

    /// Record a key cell; fails once a second representation shows up.
    pub fn observe(&mut self, value: &CellValue) -> Result<(), ReconError> {
        let kind = value.kind();
        match &self.seen {
            None => {
                self.seen = Some((kind, value.to_string()));
                Ok(())
            }
            Some((expected, _)) if *expected == kind => Ok(()),
            Some((expected, first)) => Err(ReconError::MixedKeyTypes {
                column: self.column.clone(),
                expected: format!("{expected} ('{first}')"),
                found: kind.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Checks shared by both sources: contacts and birth dates must be
/// comparable across the registration and seating tables.
pub struct KeyChecks {
    pub contact: KeyKind,
    pub date_of_birth: KeyKind,
}

impl KeyChecks {
    pub fn new() -> Self {
        Self {
            contact: KeyKind::new("contact"),
            date_of_birth: KeyKind::new("date of birth"),
        }
    }
}

impl Default for KeyChecks {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct RegistrationRows {
    pub confirmed: Vec<Registration>,
    pub skipped: usize,
}

/// Confirmed registrations only. Other statuses are counted and dropped.
pub fn read_registrations(
    table: &Table,
    source: &RegistrationSource,
    checks: &mut KeyChecks,
) -> Result<RegistrationRows, ReconError> {
    let col = &source.columns;
    let contact_idx = table.require_column(&col.contact)?;
    let dob_idx = table.require_column(&col.date_of_birth)?;
    let first_idx = table.require_column(&col.first_name)?;
    let last_idx = table.require_column(&col.last_name)?;
    let event_idx = table.require_column(&col.event)?;
    let status_idx = table.require_column(&col.status)?;

    let mut confirmed = Vec::new();
    let mut skipped = 0;

    for (i, row) in table.rows.iter().enumerate() {
        let cell = |idx: usize| row.get(idx).and_then(|c| c.as_ref());

        let paid = cell(status_idx).and_then(CellValue::as_text) == Some(source.paid_status.as_str());
        if !paid {
            skipped += 1;
            continue;
        }

        let contact = cell(contact_idx).cloned().ok_or_else(|| ReconError::MissingContact {
            table: table.name.clone(),
            row: i + 2,
        })?;
        checks.contact.observe(&contact)?;

        let date_of_birth = cell(dob_idx).cloned();
        if let Some(ref dob) = date_of_birth {
            checks.date_of_birth.observe(dob)?;
        }

        confirmed.push(Registration {
            row: i + 2,
            key: AttendeeKey {
                contact: contact.to_string(),
                date_of_birth: date_of_birth.as_ref().map(|d| d.to_string()),
            },
            contact,
            date_of_birth,
            first_name: cell(first_idx).cloned(),
            last_name: cell(last_idx).cloned(),
            event: cell(event_idx).map(|e| e.to_string()),
        });
    }

    log::info!(
        "sheet '{}': {} confirmed registrations, {} skipped",
        table.name,
        confirmed.len(),
        skipped
    );

    Ok(RegistrationRows { confirmed, skipped })
}

pub fn read_seating(
    table: &Table,
    col: &SeatingColumns,
    checks: &mut KeyChecks,
) -> Result<Vec<SeatingRecord>, ReconError> {
    let contact_idx = table.require_column(&col.contact)?;
    let dob_idx = table.require_column(&col.date_of_birth)?;
    let table_idx = table.require_column(&col.table)?;
    let name_idx = table.require_column(&col.name)?;
    let event_idx = table.require_column(&col.event)?;

    let mut records = Vec::with_capacity(table.len());

    for (i, row) in table.rows.iter().enumerate() {
        let cell = |idx: usize| row.get(idx).and_then(|c| c.as_ref());

        let contact = cell(contact_idx);
        let date_of_birth = cell(dob_idx);

        if let Some(c) = contact {
            checks.contact.observe(c)?;
        }
        if let Some(d) = date_of_birth {
            checks.date_of_birth.observe(d)?;
        }

        let key = match (contact, date_of_birth) {
            (Some(c), d) => Some(AttendeeKey {
                contact: c.to_string(),
                date_of_birth: d.map(|d| d.to_string()),
            }),
            (None, Some(d)) => {
                return Err(ReconError::OrphanDateOfBirth {
                    table: table.name.clone(),
                    row: i + 2,
                    value: d.to_string(),
                });
            }
            (None, None) => None,
        };

        records.push(SeatingRecord {
            row: i + 2,
            key,
            name: cell(name_idx).map(|n| n.to_string()),
            table: cell(table_idx).cloned(),
            event: cell(event_idx).cloned(),
        });
    }

    log::info!("seating '{}': {} rows", table.name, records.len());

    Ok(records)
}
