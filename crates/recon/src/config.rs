use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub registrations: RegistrationSource,
    #[serde(default)]
    pub seating: SeatingSource,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    /// Fail instead of warn when a name fallback hits several tables.
    #[serde(default)]
    pub fail_on_ambiguous: bool,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationSource {
    #[serde(default)]
    pub file: Option<String>,
    /// Substring identifying the registration sheet among the workbook's sheets.
    #[serde(default = "default_sheet_marker")]
    pub sheet_marker: String,
    /// Status value of a confirmed registration.
    #[serde(default = "default_paid_status")]
    pub paid_status: String,
    #[serde(default)]
    pub columns: RegistrationColumns,
}

impl Default for RegistrationSource {
    fn default() -> Self {
        Self {
            file: None,
            sheet_marker: default_sheet_marker(),
            paid_status: default_paid_status(),
            columns: RegistrationColumns::default(),
        }
    }
}

fn default_sheet_marker() -> String {
    "Convention".into()
}

fn default_paid_status() -> String {
    "Paid".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeatingSource {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub columns: SeatingColumns,
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationColumns {
    pub contact: String,
    pub date_of_birth: String,
    pub first_name: String,
    pub last_name: String,
    pub event: String,
    pub status: String,
}

impl Default for RegistrationColumns {
    fn default() -> Self {
        Self {
            contact: "Existing Contact".into(),
            date_of_birth: "Date of Birth (Existing Contact) (Contact)".into(),
            first_name: "First Name (Existing Contact) (Contact)".into(),
            last_name: "Last Name (Existing Contact) (Contact)".into(),
            event: "Event".into(),
            status: "Status Reason".into(),
        }
    }
}

impl RegistrationColumns {
    fn all(&self) -> [(&'static str, &str); 6] {
        [
            ("contact", self.contact.as_str()),
            ("date_of_birth", self.date_of_birth.as_str()),
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("event", self.event.as_str()),
            ("status", self.status.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeatingColumns {
    pub contact: String,
    pub date_of_birth: String,
    pub table: String,
    pub name: String,
    pub event: String,
}

impl Default for SeatingColumns {
    fn default() -> Self {
        Self {
            contact: "Contact".into(),
            date_of_birth: "Date of Birth (Contact) (Contact)".into(),
            table: "Table".into(),
            name: "Name".into(),
            event: "Event".into(),
        }
    }
}

impl SeatingColumns {
    fn all(&self) -> [(&'static str, &str); 5] {
        [
            ("contact", self.contact.as_str()),
            ("date_of_birth", self.date_of_birth.as_str()),
            ("table", self.table.as_str()),
            ("name", self.name.as_str()),
            ("event", self.event.as_str()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Output + Extract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub roster: Option<String>,
    pub extract: Option<String>,
    pub table_column: String,
    /// Header of the seating-assignment event ("Banquet"), kept apart from
    /// the per-registration event columns.
    pub seating_event_column: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            roster: None,
            extract: None,
            table_column: "Table".into(),
            seating_event_column: "Seating Event".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractConfig {
    #[serde(default)]
    pub names: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.registrations.sheet_marker.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "registrations.sheet_marker must not be empty".into(),
            ));
        }
        if self.registrations.paid_status.is_empty() {
            return Err(ReconError::ConfigValidation(
                "registrations.paid_status must not be empty".into(),
            ));
        }

        check_mapping("registrations.columns", &self.registrations.columns.all())?;
        check_mapping("seating.columns", &self.seating.columns.all())?;

        // Output headers must not shadow identity columns
        let out = &self.output;
        for (field, value) in [
            ("table_column", &out.table_column),
            ("seating_event_column", &out.seating_event_column),
        ] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "output.{field} must not be empty"
                )));
            }
            if self.identity_columns().contains(&value.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "output.{field} '{value}' collides with an identity column"
                )));
            }
        }
        if out.table_column == out.seating_event_column {
            return Err(ReconError::ConfigValidation(format!(
                "output.table_column and output.seating_event_column are both '{}'",
                out.table_column
            )));
        }

        for (field, path) in [
            ("registrations.file", &self.registrations.file),
            ("seating.file", &self.seating.file),
            ("output.roster", &out.roster),
            ("output.extract", &out.extract),
        ] {
            if matches!(path, Some(p) if p.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!("{field} must not be empty")));
            }
        }

        Ok(())
    }

    /// Output identity headers, in output order.
    pub fn identity_columns(&self) -> [&str; 4] {
        let c = &self.registrations.columns;
        [
            c.contact.as_str(),
            c.date_of_birth.as_str(),
            c.first_name.as_str(),
            c.last_name.as_str(),
        ]
    }
}

fn check_mapping(section: &str, columns: &[(&'static str, &str)]) -> Result<(), ReconError> {
    let mut seen = HashSet::new();
    for (field, name) in columns {
        if name.trim().is_empty() {
            return Err(ReconError::ConfigValidation(format!(
                "{section}.{field} must not be empty"
            )));
        }
        if !seen.insert(name.trim()) {
            return Err(ReconError::ConfigValidation(format!(
                "{section}.{field}: column '{name}' mapped twice"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
