use std::collections::{HashMap, HashSet};

use crate::error::ReconError;
use crate::model::{AttendeeKey, Registration};

/// Distinct attendees plus their confirmed events, built in one pass.
#[derive(Debug, Default)]
pub struct Attendees<'a> {
    /// First registration seen per attendee, in first-appearance order.
    pub people: Vec<&'a Registration>,
    /// Distinct event names in first-appearance order.
    pub event_columns: Vec<String>,
    pub memberships: HashMap<AttendeeKey, HashSet<String>>,
}

impl Attendees<'_> {
    /// Pivot one attendee's events onto the event columns.
    pub fn event_cells(&self, key: &AttendeeKey) -> Vec<Option<String>> {
        let events = self.memberships.get(key);
        self.event_columns
            .iter()
            .map(|e| match events {
                Some(set) if set.contains(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Group confirmed registrations by (contact, date of birth).
pub fn collect_attendees(registrations: &[Registration]) -> Result<Attendees<'_>, ReconError> {
    let mut out = Attendees::default();
    let mut index: HashMap<&AttendeeKey, usize> = HashMap::new();
    let mut seen_events: HashSet<&str> = HashSet::new();

    for reg in registrations {
        if let Some(event) = reg.event.as_deref() {
            if seen_events.insert(event) {
                out.event_columns.push(event.to_string());
            }
            out.memberships
                .entry(reg.key.clone())
                .or_default()
                .insert(event.to_string());
        }

        match index.get(&reg.key) {
            Some(&i) => {
                let first = out.people[i];
                if first.first_name != reg.first_name || first.last_name != reg.last_name {
                    return Err(ReconError::ConflictingNames {
                        contact: reg.key.contact.clone(),
                        date_of_birth: reg
                            .key
                            .date_of_birth
                            .clone()
                            .unwrap_or_else(|| "no date of birth".into()),
                        first: full_name(first),
                        second: full_name(reg),
                    });
                }
            }
            None => {
                index.insert(&reg.key, out.people.len());
                out.people.push(reg);
            }
        }
    }

    log::info!(
        "{} attendees across {} events",
        out.people.len(),
        out.event_columns.len()
    );

    Ok(out)
}

fn full_name(reg: &Registration) -> String {
    let part = |v: &Option<crate::table::CellValue>| v.as_ref().map(|c| c.to_string()).unwrap_or_default();
    format!("{} {}", part(&reg.first_name), part(&reg.last_name))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn reg(contact: &str, dob: &str, first: &str, last: &str, event: &str) -> Registration {
        Registration {
            row: 0,
            key: AttendeeKey {
                contact: contact.into(),
                date_of_birth: Some(dob.into()),
            },
            contact: CellValue::Text(contact.into()),
            date_of_birth: Some(CellValue::Text(dob.into())),
            first_name: Some(CellValue::Text(first.into())),
            last_name: Some(CellValue::Text(last.into())),
            event: Some(event.into()),
        }
    }

    #[test]
    fn collapses_events_onto_one_attendee() {
        let regs = vec![
            reg("1", "1990-01-01", "Ann", "Lee", "Gala"),
            reg("1", "1990-01-01", "Ann", "Lee", "Workshop"),
            reg("2", "1980-05-05", "Bo", "Kim", "Workshop"),
        ];
        let attendees = collect_attendees(&regs).unwrap();
        assert_eq!(attendees.people.len(), 2);
        assert_eq!(attendees.event_columns, vec!["Gala", "Workshop"]);
        assert_eq!(
            attendees.event_cells(&regs[0].key),
            vec![Some("Gala".to_string()), Some("Workshop".to_string())]
        );
        assert_eq!(
            attendees.event_cells(&regs[2].key),
            vec![None, Some("Workshop".to_string())]
        );
    }

    #[test]
    fn same_contact_different_dob_are_distinct() {
        let regs = vec![
            reg("Ann Lee", "1990-01-01", "Ann", "Lee", "Gala"),
            reg("Ann Lee", "2001-07-07", "Ann", "Lee", "Gala"),
        ];
        let attendees = collect_attendees(&regs).unwrap();
        assert_eq!(attendees.people.len(), 2);
        assert_eq!(attendees.event_columns.len(), 1);
    }

    #[test]
    fn conflicting_names_rejected() {
        let regs = vec![
            reg("1", "1990-01-01", "Ann", "Lee", "Gala"),
            reg("1", "1990-01-01", "Anne", "Lee", "Workshop"),
        ];
        let err = collect_attendees(&regs).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'Ann Lee'"), "{msg}");
        assert!(msg.contains("'Anne Lee'"), "{msg}");
    }

    #[test]
    fn registration_without_event_adds_no_column() {
        let mut r = reg("1", "1990-01-01", "Ann", "Lee", "Gala");
        r.event = None;
        let regs = vec![r];
        let attendees = collect_attendees(&regs).unwrap();
        assert_eq!(attendees.people.len(), 1);
        assert!(attendees.event_columns.is_empty());
        assert!(attendees.event_cells(&regs[0].key).is_empty());
    }
}
