//! `roster run` / `roster extract` / `roster validate`.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use roster_io::{load_table, load_workbook, save_table, LoadOptions};
use roster_recon::{extract, run, ReconConfig, ReconError, ReconInput, Roster, Table};

use crate::CliError;

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub registrations: Option<PathBuf>,
    pub seating: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub extract_output: Option<PathBuf>,
    pub names: Vec<String>,
    pub sheet_marker: Option<String>,
    pub fail_on_ambiguous: bool,
    pub repair_text: bool,
    pub json: bool,
}

/// Input and output locations after merging flags over the config.
#[derive(Debug, PartialEq)]
struct Paths {
    registrations: PathBuf,
    seating: PathBuf,
    roster: PathBuf,
    extract: Option<PathBuf>,
}

fn read_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::recon(ReconError::Io(format!("cannot read config {}: {e}", path.display())))
    })?;
    ReconConfig::from_toml(&text).map_err(CliError::recon)
}

/// Config paths are relative to the config file; flag paths are used as given.
fn resolve(flag: Option<PathBuf>, configured: Option<&String>, base_dir: &Path) -> Option<PathBuf> {
    flag.or_else(|| configured.map(|p| base_dir.join(p)))
}

fn required(path: Option<PathBuf>, flag: &str, key: &str) -> Result<PathBuf, CliError> {
    path.ok_or_else(|| {
        CliError::args(format!("no {} path given", flag.trim_start_matches("--")))
            .with_hint(format!("pass {flag} or set {key} in the config"))
    })
}

fn merge(args: &mut RunArgs, config: &mut ReconConfig, base_dir: &Path) -> Result<Paths, CliError> {
    if let Some(marker) = args.sheet_marker.take() {
        config.registrations.sheet_marker = marker;
    }
    let names_from_flags = !args.names.is_empty();
    if names_from_flags {
        config.extract.names = std::mem::take(&mut args.names);
    }
    if args.fail_on_ambiguous {
        config.fail_on_ambiguous = true;
    }
    config.validate().map_err(CliError::recon)?;

    let registrations = resolve(args.registrations.take(), config.registrations.file.as_ref(), base_dir);
    let seating = resolve(args.seating.take(), config.seating.file.as_ref(), base_dir);
    let roster = resolve(args.output.take(), config.output.roster.as_ref(), base_dir);
    let extract = resolve(args.extract_output.take(), config.output.extract.as_ref(), base_dir);

    let paths = Paths {
        registrations: required(registrations, "--registrations", "registrations.file")?,
        seating: required(seating, "--seating", "seating.file")?,
        roster: required(roster, "--output", "output.roster")?,
        extract,
    };

    if paths.extract.as_ref() == Some(&paths.roster) {
        return Err(CliError::args("roster and extract outputs are the same file"));
    }
    if paths.extract.is_none() {
        if names_from_flags {
            return Err(CliError::args("--name given but no extract output")
                .with_hint("pass --extract-output or set output.extract in the config"));
        }
        if !config.extract.names.is_empty() {
            log::warn!(
                "extract.names lists {} name(s) but output.extract is not set; no extract written",
                config.extract.names.len()
            );
        }
    }
    Ok(paths)
}

pub fn cmd_run(mut args: RunArgs) -> Result<(), CliError> {
    let (mut config, base_dir) = match args.config.take() {
        Some(path) => {
            let config = read_config(&path)?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (config, base)
        }
        None => (ReconConfig::default(), PathBuf::new()),
    };

    let paths = merge(&mut args, &mut config, &base_dir)?;
    let options = LoadOptions { repair_text: args.repair_text };

    let input = ReconInput {
        registration_sheets: load_workbook(&paths.registrations, &options).map_err(CliError::recon)?,
        seating: load_table(&paths.seating, &options).map_err(CliError::recon)?,
    };

    let roster = run(&config, &input).map_err(CliError::recon)?;
    let table = roster.to_table(&config);

    let extracted = match &paths.extract {
        Some(_) => {
            let names: BTreeSet<String> = config.extract.names.iter().cloned().collect();
            let identity = &config.registrations.columns.contact;
            Some(extract(&table, identity, &names).map_err(CliError::recon)?)
        }
        None => None,
    };

    let mut outputs = vec![(table, paths.roster.clone())];
    if let (Some(t), Some(p)) = (extracted, paths.extract.clone()) {
        outputs.push((t, p));
    }
    write_all(&outputs)?;

    if args.json {
        let json = serde_json::to_string_pretty(&roster.summary)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    eprintln!("{}", summary_line(&roster, &outputs));
    Ok(())
}

fn summary_line(roster: &Roster, outputs: &[(Table, PathBuf)]) -> String {
    let s = &roster.summary;
    let mut line = format!(
        "roster: {} attendees ({} exact, {} by name, {} unseated), {} guests, {} event columns from '{}' -> {}",
        s.attendees,
        s.exact_matches,
        s.fallback_matches,
        s.unseated,
        s.guests,
        roster.event_columns.len(),
        roster.sheet,
        outputs[0].1.display(),
    );
    if let Some((table, path)) = outputs.get(1) {
        line.push_str(&format!("; extract: {} rows -> {}", table.len(), path.display()));
    }
    if s.ambiguous_fallbacks > 0 {
        line.push_str(&format!("; {} ambiguous name fallbacks", s.ambiguous_fallbacks));
    }
    line
}

/// Hidden sibling of `path` tagged `partial` or `backup`; keeps the extension
/// so the writer picks the same format.
fn sibling_path(path: &Path, tag: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!(".{stem}.{tag}.{}", ext.to_string_lossy()),
        None => format!(".{stem}.{tag}"),
    };
    path.with_file_name(name)
}

fn staging_path(path: &Path) -> PathBuf {
    sibling_path(path, "partial")
}

/// An output moved into place, and where its previous contents were parked.
struct Placed<'a> {
    path: &'a Path,
    backup: Option<PathBuf>,
}

/// Write every output to a staging file, then move them all into place.
/// Either every output is replaced or none is.
fn write_all(outputs: &[(Table, PathBuf)]) -> Result<(), CliError> {
    for (_, path) in outputs {
        if path.is_dir() {
            return Err(CliError::output(format!("cannot write {}: is a directory", path.display())));
        }
    }

    let mut staged: Vec<PathBuf> = Vec::with_capacity(outputs.len());
    for (table, path) in outputs {
        let tmp = staging_path(path);
        staged.push(tmp.clone());
        if let Err(e) = save_table(table, &tmp) {
            discard(&staged);
            return Err(CliError::output(format!("cannot write {}: {e}", path.display())));
        }
    }

    let mut placed: Vec<Placed> = Vec::with_capacity(outputs.len());
    for (i, ((_, path), tmp)) in outputs.iter().zip(&staged).enumerate() {
        match place(tmp, path) {
            Ok(backup) => placed.push(Placed { path, backup }),
            Err(e) => {
                discard(&staged[i..]);
                roll_back(&placed);
                return Err(CliError::output(format!(
                    "failed to move output into place at {}: {e}",
                    path.display()
                )));
            }
        }
    }

    for p in &placed {
        if let Some(backup) = &p.backup {
            if let Err(e) = fs::remove_file(backup) {
                log::warn!("could not remove backup {}: {e}", backup.display());
            }
        }
    }
    Ok(())
}

/// Rename `tmp` over `path`, parking an existing file at its backup path first.
fn place(tmp: &Path, path: &Path) -> io::Result<Option<PathBuf>> {
    let backup = if path.is_file() {
        let backup = sibling_path(path, "backup");
        fs::rename(path, &backup)?;
        Some(backup)
    } else {
        None
    };
    if let Err(e) = fs::rename(tmp, path) {
        if let Some(backup) = &backup {
            restore(backup, path);
        }
        return Err(e);
    }
    Ok(backup)
}

/// Undo `place` for outputs already moved, newest first.
fn roll_back(placed: &[Placed]) {
    for p in placed.iter().rev() {
        if let Err(e) = fs::remove_file(p.path) {
            log::warn!("could not remove {}: {e}", p.path.display());
        }
        if let Some(backup) = &p.backup {
            restore(backup, p.path);
        }
    }
}

fn restore(backup: &Path, path: &Path) {
    if let Err(e) = fs::rename(backup, path) {
        log::warn!(
            "could not restore {} from {}: {e}",
            path.display(),
            backup.display()
        );
    }
}

fn discard(staged: &[PathBuf]) {
    for tmp in staged {
        if tmp.exists() {
            if let Err(e) = fs::remove_file(tmp) {
                log::warn!("could not remove staging file {}: {e}", tmp.display());
            }
        }
    }
}

pub fn cmd_extract(
    input: PathBuf,
    names: Vec<String>,
    column: String,
    output: PathBuf,
) -> Result<(), CliError> {
    if input == output {
        return Err(CliError::args("input and output are the same file"));
    }
    let table = load_table(&input, &LoadOptions::default()).map_err(CliError::recon)?;
    let names: BTreeSet<String> = names.into_iter().collect();
    let filtered = extract(&table, &column, &names).map_err(CliError::recon)?;

    let outputs = vec![(filtered, output)];
    write_all(&outputs)?;
    eprintln!(
        "extract: {} of {} rows -> {}",
        outputs[0].0.len(),
        table.len(),
        outputs[0].1.display()
    );
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "valid: '{}' marker '{}', paid status '{}', {} extract name(s)",
        config.name.as_deref().unwrap_or("roster"),
        config.registrations.sheet_marker,
        config.registrations.paid_status,
        config.extract.names.len(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            registrations: None,
            seating: None,
            output: None,
            extract_output: None,
            names: Vec::new(),
            sheet_marker: None,
            fail_on_ambiguous: false,
            repair_text: true,
            json: false,
        }
    }

    fn config(toml: &str) -> ReconConfig {
        ReconConfig::from_toml(toml).unwrap()
    }

    #[test]
    fn config_paths_resolve_against_config_dir() {
        let mut c = config(
            r#"
[registrations]
file = "in/regs.xlsx"
[seating]
file = "in/seating.xlsx"
[output]
roster = "out/roster.xlsx"
"#,
        );
        let paths = merge(&mut args(), &mut c, Path::new("/events/2026")).unwrap();
        assert_eq!(paths.registrations, PathBuf::from("/events/2026/in/regs.xlsx"));
        assert_eq!(paths.seating, PathBuf::from("/events/2026/in/seating.xlsx"));
        assert_eq!(paths.roster, PathBuf::from("/events/2026/out/roster.xlsx"));
        assert_eq!(paths.extract, None);
    }

    #[test]
    fn flags_override_config() {
        let mut c = config(
            r#"
[registrations]
file = "regs.xlsx"
sheet_marker = "Convention"
[seating]
file = "seating.xlsx"
[output]
roster = "roster.xlsx"
extract = "vip.xlsx"
[extract]
names = ["Ann Lee"]
"#,
        );
        let mut a = args();
        a.registrations = Some(PathBuf::from("other.csv"));
        a.sheet_marker = Some("Summit".into());
        a.names = vec!["Bo Kim".into()];
        a.fail_on_ambiguous = true;

        let paths = merge(&mut a, &mut c, Path::new("cfg")).unwrap();
        assert_eq!(paths.registrations, PathBuf::from("other.csv"));
        assert_eq!(paths.seating, PathBuf::from("cfg/seating.xlsx"));
        assert_eq!(c.registrations.sheet_marker, "Summit");
        assert_eq!(c.extract.names, vec!["Bo Kim"]);
        assert!(c.fail_on_ambiguous);
    }

    #[test]
    fn missing_path_is_usage_error() {
        let mut c = ReconConfig::default();
        let mut a = args();
        a.registrations = Some("regs.xlsx".into());
        let err = merge(&mut a, &mut c, Path::new("")).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert!(err.message.contains("seating"), "{}", err.message);
        assert!(err.hint.unwrap().contains("seating.file"));
    }

    #[test]
    fn empty_marker_flag_rejected() {
        let mut c = ReconConfig::default();
        let mut a = args();
        a.sheet_marker = Some("  ".into());
        let err = merge(&mut a, &mut c, Path::new("")).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_CONFIG);
    }

    #[test]
    fn same_output_twice_rejected() {
        let mut c = ReconConfig::default();
        let mut a = args();
        a.registrations = Some("r.csv".into());
        a.seating = Some("s.csv".into());
        a.output = Some("out.xlsx".into());
        a.extract_output = Some("out.xlsx".into());
        assert!(merge(&mut a, &mut c, Path::new("")).is_err());
    }

    #[test]
    fn name_flags_need_an_extract_output() {
        let mut c = ReconConfig::default();
        let mut a = args();
        a.registrations = Some("r.csv".into());
        a.seating = Some("s.csv".into());
        a.output = Some("out.xlsx".into());
        a.names = vec!["Ann Lee".into()];
        let err = merge(&mut a, &mut c, Path::new("")).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert!(err.hint.unwrap().contains("--extract-output"));

        // Names from the config alone only warn
        let mut c = config("[extract]\nnames = [\"Ann Lee\"]\n");
        let mut a = args();
        a.registrations = Some("r.csv".into());
        a.seating = Some("s.csv".into());
        a.output = Some("out.xlsx".into());
        assert_eq!(merge(&mut a, &mut c, Path::new("")).unwrap().extract, None);
    }

    fn one_column(name: &str) -> Table {
        let mut t = Table::new("Roster", vec!["Existing Contact".into()]);
        t.push_row(vec![Some(name.into())]).unwrap();
        t
    }

    #[test]
    fn write_all_replaces_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        fs::write(&roster, "old\n").unwrap();

        write_all(&[(one_column("Ann Lee"), roster.clone())]).unwrap();
        assert_eq!(fs::read_to_string(&roster).unwrap(), "Existing Contact\nAnn Lee\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn roll_back_restores_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join("roster.csv");
        let fresh = dir.path().join("extract.csv");
        fs::write(&roster, "old\n").unwrap();

        let tmp = staging_path(&roster);
        fs::write(&tmp, "new\n").unwrap();
        let backup = place(&tmp, &roster).unwrap();
        assert_eq!(fs::read_to_string(&roster).unwrap(), "new\n");

        let tmp = staging_path(&fresh);
        fs::write(&tmp, "new\n").unwrap();
        let none = place(&tmp, &fresh).unwrap();
        assert_eq!(none, None);

        roll_back(&[
            Placed { path: &roster, backup },
            Placed { path: &fresh, backup: none },
        ]);
        assert_eq!(fs::read_to_string(&roster).unwrap(), "old\n");
        assert!(!fresh.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn place_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = staging_path(&dir.path().join("roster.csv"));
        fs::write(&tmp, "new\n").unwrap();
        // Destination directory does not exist, so the rename fails
        let target = dir.path().join("missing").join("roster.csv");
        assert!(place(&tmp, &target).is_err());
        discard(&[tmp.clone()]);
        assert!(!tmp.exists());
    }

    #[test]
    fn staging_keeps_extension() {
        let p = staging_path(Path::new("/tmp/out/roster.xlsx"));
        assert_eq!(p, PathBuf::from("/tmp/out/.roster.partial.xlsx"));
        assert_eq!(
            roster_io::FileFormat::from_path(&p).unwrap(),
            roster_io::FileFormat::Excel
        );
    }
}
