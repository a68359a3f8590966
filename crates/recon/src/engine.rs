use std::cmp::Ordering;

use crate::aggregate::collect_attendees;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::matcher::SeatingIndex;
use crate::model::{ReconInput, Roster, RosterRow, RosterSummary, RowKind, SeatSource};
use crate::records::{read_registrations, read_seating, KeyChecks};
use crate::table::{CellValue, Table};

/// Pick the registration sheet and reconcile it against the seating chart.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<Roster, ReconError> {
    let sheet = select_sheet(&input.registration_sheets, &config.registrations.sheet_marker)?;
    reconcile(config, sheet, &input.seating)
}

/// First sheet whose name contains `marker`.
pub fn select_sheet<'a>(sheets: &'a [Table], marker: &str) -> Result<&'a Table, ReconError> {
    let sheet = sheets
        .iter()
        .find(|t| t.name.contains(marker))
        .ok_or_else(|| ReconError::MissingSheet {
            marker: marker.to_string(),
            available: sheets.iter().map(|t| t.name.clone()).collect(),
        })?;
    log::info!("registration sheet: '{}'", sheet.name);
    Ok(sheet)
}

/// Merge confirmed registrations with the seating chart into one row per
/// attendee, then append seating-only guests.
pub fn reconcile(
    config: &ReconConfig,
    registrations: &Table,
    seating: &Table,
) -> Result<Roster, ReconError> {
    let mut registrations = registrations.clone();
    let mut seating = seating.clone();
    registrations.trim_headers();
    seating.trim_headers();

    let mut checks = KeyChecks::new();
    let regs = read_registrations(&registrations, &config.registrations, &mut checks)?;
    let seats = read_seating(&seating, &config.seating.columns, &mut checks)?;

    let attendees = collect_attendees(&regs.confirmed)?;
    check_event_columns(config, &attendees.event_columns)?;

    let index = SeatingIndex::build(&seats);

    let mut summary = RosterSummary {
        confirmed_registrations: regs.confirmed.len(),
        skipped_registrations: regs.skipped,
        ..RosterSummary::default()
    };

    let mut rows = Vec::with_capacity(attendees.people.len() + seats.len());

    for person in &attendees.people {
        let seat = index.resolve(&person.key, &person.contact);

        match seat.source {
            SeatSource::Exact => summary.exact_matches += 1,
            SeatSource::NameFallback => {
                summary.fallback_matches += 1;
                log::debug!("'{}' seated by name fallback", person.key.contact);
            }
            SeatSource::Unseated => summary.unseated += 1,
        }

        if !seat.ambiguous_tables.is_empty() {
            summary.ambiguous_fallbacks += 1;
            if config.fail_on_ambiguous {
                return Err(ReconError::AmbiguousFallback {
                    name: person.key.contact.clone(),
                    tables: seat.ambiguous_tables,
                });
            }
            log::warn!(
                "name '{}' matches seating rows at tables {}; using the first",
                person.key.contact,
                seat.ambiguous_tables.join(", ")
            );
        }

        rows.push(RosterRow {
            kind: RowKind::Attendee,
            contact: person.contact.clone(),
            date_of_birth: person.date_of_birth.clone(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            events: attendees.event_cells(&person.key),
            table: seat.table,
            seating_event: seat.event,
            seat_source: seat.source,
        });
    }
    summary.attendees = rows.len();

    // Banquet guests: seated by name only, no registration
    for rec in seats.iter().filter(|r| r.key.is_none()) {
        let Some(ref name) = rec.name else { continue };
        rows.push(RosterRow {
            kind: RowKind::Guest,
            contact: CellValue::Text(name.clone()),
            date_of_birth: None,
            first_name: None,
            last_name: None,
            events: vec![None; attendees.event_columns.len()],
            table: rec.table.clone(),
            seating_event: rec.event.clone(),
            seat_source: if rec.table.is_some() { SeatSource::Exact } else { SeatSource::Unseated },
        });
        summary.guests += 1;
    }

    // Stable: equal names keep their order, guests stay at the end
    rows.sort_by(|a, b| {
        compare_names(&a.last_name, &b.last_name)
            .then_with(|| compare_names(&a.first_name, &b.first_name))
    });

    log::info!(
        "roster: {} attendees, {} guests, {} exact, {} by name, {} unseated",
        summary.attendees,
        summary.guests,
        summary.exact_matches,
        summary.fallback_matches,
        summary.unseated
    );

    Ok(Roster {
        sheet: registrations.name.clone(),
        event_columns: attendees.event_columns,
        rows,
        summary,
    })
}

/// Byte-wise on the display form; empty names sort last.
fn compare_names(a: &Option<CellValue>, b: &Option<CellValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// An event named like a fixed output column would make the output ambiguous.
fn check_event_columns(config: &ReconConfig, events: &[String]) -> Result<(), ReconError> {
    let reserved = config.identity_columns();
    for event in events {
        if reserved.contains(&event.as_str())
            || *event == config.output.table_column
            || *event == config.output.seating_event_column
        {
            return Err(ReconError::ConfigValidation(format!(
                "event '{event}' has the same name as an output column; rename the output column in [output]"
            )));
        }
    }
    Ok(())
}
