use std::collections::BTreeSet;
use std::path::PathBuf;

use roster_recon::model::{RowKind, SeatSource};
use roster_recon::{extract_names, run, CellValue, ErrorKind, ReconConfig, ReconInput, Table};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(name: &str, file: &str) -> Table {
    let path = fixtures_dir().join(file);
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    Table::from_csv_str(name, &data, b',').unwrap()
}

fn input(seating_file: &str) -> ReconInput {
    ReconInput {
        registration_sheets: vec![
            Table::new("Summary", vec!["Total".into()]),
            load("Convention Registrations", "convention-registrations.csv"),
        ],
        seating: load("Seating Chart", seating_file),
    }
}

fn contacts(table: &Table) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|r| r[0].as_ref().map(|c| c.to_string()).unwrap_or_default())
        .collect()
}

#[test]
fn consolidated_roster() {
    let config = ReconConfig::default();
    let roster = run(&config, &input("seating-chart.csv")).unwrap();

    assert_eq!(roster.sheet, "Convention Registrations");
    assert_eq!(roster.event_columns, vec!["Gala Dinner", "Youth Workshop"]);

    let s = &roster.summary;
    assert_eq!(s.confirmed_registrations, 5);
    assert_eq!(s.skipped_registrations, 2);
    assert_eq!(s.attendees, 4);
    assert_eq!(s.guests, 2);
    assert_eq!(s.exact_matches, 1);
    assert_eq!(s.fallback_matches, 1);
    assert_eq!(s.unseated, 2);
    assert_eq!(s.ambiguous_fallbacks, 0);

    let table = roster.to_table(&config);
    assert_eq!(
        table.headers,
        vec![
            "Existing Contact",
            "Date of Birth (Existing Contact) (Contact)",
            "First Name (Existing Contact) (Contact)",
            "Last Name (Existing Contact) (Contact)",
            "Gala Dinner",
            "Youth Workshop",
            "Table",
            "Seating Event",
        ]
    );
    assert_eq!(
        contacts(&table),
        vec!["Eve Adams", "Bo Kim", "Ann Lee", "Dee Park", "Pastor Mike", "Grace Hall"]
    );

    // Ann: both events, exact seat
    let ann = &table.rows[2];
    assert_eq!(ann[4], Some(CellValue::Text("Gala Dinner".into())));
    assert_eq!(ann[5], Some(CellValue::Text("Youth Workshop".into())));
    assert_eq!(ann[6], Some(CellValue::Number(5.0)));
    assert_eq!(ann[7], Some(CellValue::Text("Banquet".into())));

    // Bo: birth date disagrees, seated through the name fallback
    let bo = &roster.rows[1];
    assert_eq!(bo.seat_source, SeatSource::NameFallback);
    assert_eq!(bo.table, Some(CellValue::Number(9.0)));
    assert_eq!(bo.events, vec![Some("Gala Dinner".to_string()), None]);

    // Dee: matched exactly but has no table
    let dee = &roster.rows[3];
    assert_eq!(dee.seat_source, SeatSource::Unseated);
    assert_eq!(dee.table, None);

    // Guests carry only seating data
    for guest in &roster.rows[4..] {
        assert_eq!(guest.kind, RowKind::Guest);
        assert!(guest.events.iter().all(Option::is_none));
        assert_eq!(guest.table, Some(CellValue::Number(12.0)));
        assert!(guest.last_name.is_none());
    }
}

#[test]
fn identities_appear_once() {
    let roster = run(&ReconConfig::default(), &input("seating-chart.csv")).unwrap();
    let mut seen = BTreeSet::new();
    for row in roster.rows.iter().filter(|r| r.kind == RowKind::Attendee) {
        let key = (row.contact.to_string(), row.date_of_birth.as_ref().map(|d| d.to_string()));
        assert!(seen.insert(key), "duplicate attendee {}", row.contact);
    }
}

#[test]
fn rerun_is_identical() {
    let config = ReconConfig::default();
    let first = run(&config, &input("seating-chart.csv")).unwrap().to_table(&config);
    let second = run(&config, &input("seating-chart.csv")).unwrap().to_table(&config);
    assert_eq!(first, second);
}

#[test]
fn extract_from_roster() {
    let config = ReconConfig::default();
    let table = run(&config, &input("seating-chart.csv")).unwrap().to_table(&config);

    let names: BTreeSet<String> = ["Grace Hall", "Ann Lee", "Nobody"].iter().map(|s| s.to_string()).collect();
    let filtered = extract_names(&table, &names).unwrap();
    assert_eq!(filtered.headers, table.headers);
    assert_eq!(contacts(&filtered), vec!["Ann Lee", "Grace Hall"]);

    let empty = extract_names(&table, &BTreeSet::new()).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.headers, table.headers);
}

#[test]
fn mixed_birth_date_representations_abort() {
    let err = run(&ReconConfig::default(), &input("mixed-dob-seating.csv")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    assert!(err.to_string().contains("19900101"), "{err}");
}

#[test]
fn custom_marker_and_columns() {
    let config = ReconConfig::from_toml(
        r#"
[registrations]
sheet_marker = "Registrations"
paid_status = "Pending"

[output]
table_column = "Seat"
seating_event_column = "Night"
"#,
    )
    .unwrap();
    let roster = run(&config, &input("seating-chart.csv")).unwrap();
    // Only Bo's pending golf registration counts now
    assert_eq!(roster.event_columns, vec!["Golf Outing"]);
    assert_eq!(roster.summary.attendees, 1);

    let table = roster.to_table(&config);
    assert_eq!(table.headers[5..], ["Seat".to_string(), "Night".to_string()]);
}
