// CSV/TSV import/export

use std::io::Read;
use std::path::Path;

use roster_recon::{ReconError, Table};

fn io_err(path: &Path, e: impl std::fmt::Display) -> ReconError {
    ReconError::Io(format!("{}: {e}", path.display()))
}

/// Import a delimited file. The table is named after the file stem so the
/// sheet marker can select a CSV export the same way it selects a worksheet.
pub fn import(path: &Path) -> Result<Table, ReconError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&table_name(path), &content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Table, ReconError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&table_name(path), &content, b'\t')
}

fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Guess the field separator of a registration or seating export from its
/// first lines. A candidate only counts if it splits the header; among those,
/// the one giving the header's width on the most lines wins, with ties going
/// to the earlier entry in `DELIMITERS`.
pub(crate) fn sniff_delimiter(content: &str) -> u8 {
    let head: Vec<&str> = content.lines().take(10).collect();

    let mut chosen = b',';
    let mut chosen_score = 0usize;
    for delim in DELIMITERS {
        let widths: Vec<usize> = head.iter().map(|line| field_count(line, delim)).collect();
        let Some(&header_width) = widths.first() else {
            break;
        };
        if header_width < 2 {
            continue;
        }
        let agreeing = widths.iter().filter(|&&w| w == header_width).count();
        let score = agreeing * header_width;
        if score > chosen_score {
            chosen_score = score;
            chosen = delim;
        }
    }
    chosen
}

/// Fields on one line, honoring quotes.
fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, ReconError> {
    let mut file = std::fs::File::open(path).map_err(|e| io_err(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| io_err(path, e))?;

    // Excel writes a BOM on "CSV UTF-8" exports
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::warn!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(name: &str, content: &str, delimiter: u8) -> Result<Table, ReconError> {
    let table = Table::from_csv_str(name, content, delimiter)?;
    log::debug!(
        "csv '{}': {} columns, {} rows (delimiter {:?})",
        name,
        table.width(),
        table.len(),
        delimiter as char
    );
    Ok(table)
}

pub fn export(table: &Table, path: &Path) -> Result<(), ReconError> {
    export_with_delimiter(table, path, b',')
}

pub fn export_tsv(table: &Table, path: &Path) -> Result<(), ReconError> {
    export_with_delimiter(table, path, b'\t')
}

fn export_with_delimiter(table: &Table, path: &Path, delimiter: u8) -> Result<(), ReconError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| io_err(path, e))?;

    writer.write_record(&table.headers).map_err(|e| io_err(path, e))?;
    for row in &table.rows {
        let record: Vec<String> = row
            .iter()
            .map(|cell| cell.as_ref().map(|c| c.to_string()).unwrap_or_default())
            .collect();
        writer.write_record(&record).map_err(|e| io_err(path, e))?;
    }

    writer.flush().map_err(|e| io_err(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_recon::CellValue;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn european_export_uses_semicolons() {
        let content = "Contact;DOB;Event\nAnn Lee;1990-01-01;Gala Dinner\nBo Kim;1985-06-15;Golf Outing\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn quoted_commas_do_not_outvote_semicolons() {
        let content = "Contact;Address\n\"Lee, Ann\";\"12 Elm St, Unit 3\"\nBo Kim;\"4 Oak Rd\"\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn tab_and_pipe_exports() {
        assert_eq!(sniff_delimiter("Contact\tTable\nAnn Lee\t5\n"), b'\t');
        assert_eq!(sniff_delimiter("Contact|Table\nAnn Lee|5\n"), b'|');
    }

    #[test]
    fn single_column_or_empty_falls_back_to_comma() {
        assert_eq!(sniff_delimiter(""), b',');
        assert_eq!(sniff_delimiter("Contact\nAnn Lee\n"), b',');
        assert_eq!(sniff_delimiter("Contact,Table\nAnn Lee,5\n"), b',');
    }

    #[test]
    fn test_semicolon_csv_import_named_by_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Convention 2026.csv");
        fs::write(&path, "Contact;Table\nAnn Lee;5\nBo Kim;\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.name, "Convention 2026");
        assert_eq!(table.headers, vec!["Contact", "Table"]);
        assert_eq!(table.rows[0][0], Some(CellValue::Text("Ann Lee".into())));
        assert_eq!(table.rows[0][1], Some(CellValue::Number(5.0)));
        assert_eq!(table.rows[1][1], None);
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        // "Zoë" with 0xEB as the Windows-1252 e-diaeresis
        fs::write(&path, b"First,Last\nZo\xEB,Li\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.rows[0][0], Some(CellValue::Text("Zoë".into())));
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, b"\xEF\xBB\xBFContact,Table\nAnn Lee,5\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.headers[0], "Contact");
    }

    #[test]
    fn test_export_writes_header_and_blank_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut table = Table::new("Roster", vec!["Contact".into(), "Table".into()]);
        table.push_row(vec![Some("Ann Lee".into()), Some(CellValue::Number(5.0))]).unwrap();
        table.push_row(vec![Some("Doe, Jane".into()), None]).unwrap();
        export(&table, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Contact,Table\nAnn Lee,5\n\"Doe, Jane\",\n");
    }

    #[test]
    fn test_header_only_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let table = Table::new("Roster", vec!["Contact".into(), "Table".into()]);
        export(&table, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Contact,Table\n");
    }

    #[test]
    fn test_tsv_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.tsv");

        let mut table = Table::new("test", vec!["Name".into(), "Value".into()]);
        table.push_row(vec![Some("Alice".into()), Some(CellValue::Number(42.0))]).unwrap();
        table.push_row(vec![Some("Bob".into()), Some(CellValue::Number(17.0))]).unwrap();
        export_tsv(&table, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains('\t'), "TSV should contain tab characters");

        let imported = import_tsv(&path).unwrap();
        assert_eq!(imported, table);
    }
}
