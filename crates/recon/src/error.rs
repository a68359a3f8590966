use std::fmt;

/// Broad failure class. Drives exit codes in the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing sheet, column or file; bad config.
    Configuration,
    /// Identity keys that cannot be compared or are contradictory.
    DataIntegrity,
    /// Failure writing output.
    Io,
}

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty marker, colliding column names, etc.).
    ConfigValidation(String),
    /// No registration sheet name contains the marker.
    MissingSheet { marker: String, available: Vec<String> },
    /// Missing required column in an input table.
    MissingColumn { table: String, column: String },
    /// A data row has more cells than the header.
    RaggedRow { table: String, row: usize, width: usize, cells: usize },
    /// Key cells of one column come in more than one representation.
    MixedKeyTypes { column: String, expected: String, found: String, value: String },
    /// Confirmed registration without a contact identifier.
    MissingContact { table: String, row: usize },
    /// Seating row with a date of birth but no contact identifier.
    OrphanDateOfBirth { table: String, row: usize, value: String },
    /// Same identity key registered under two different names.
    ConflictingNames { contact: String, date_of_birth: String, first: String, second: String },
    /// Name fallback hit seating rows with different tables.
    AmbiguousFallback { name: String, tables: Vec<String> },
    /// IO error (file read, etc.).
    Io(String),
}

impl ReconError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigParse(_)
            | Self::ConfigValidation(_)
            | Self::MissingSheet { .. }
            | Self::MissingColumn { .. }
            | Self::RaggedRow { .. } => ErrorKind::Configuration,
            Self::MixedKeyTypes { .. }
            | Self::MissingContact { .. }
            | Self::OrphanDateOfBirth { .. }
            | Self::ConflictingNames { .. }
            | Self::AmbiguousFallback { .. } => ErrorKind::DataIntegrity,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingSheet { marker, available } => {
                write!(
                    f,
                    "sheet selection: no sheet name contains '{marker}' (found: {})",
                    if available.is_empty() { "none".to_string() } else { available.join(", ") }
                )
            }
            Self::MissingColumn { table, column } => {
                write!(f, "table '{table}': missing column '{column}'")
            }
            Self::RaggedRow { table, row, width, cells } => {
                write!(f, "table '{table}', row {row}: {cells} cells but only {width} headers")
            }
            Self::MixedKeyTypes { column, expected, found, value } => {
                write!(
                    f,
                    "key matching: column '{column}' mixes {expected} and {found} values (offending value '{value}')"
                )
            }
            Self::MissingContact { table, row } => {
                write!(f, "key matching: table '{table}', row {row}: confirmed registration has no contact")
            }
            Self::OrphanDateOfBirth { table, row, value } => {
                write!(
                    f,
                    "key matching: table '{table}', row {row}: date of birth '{value}' without a contact"
                )
            }
            Self::ConflictingNames { contact, date_of_birth, first, second } => {
                write!(
                    f,
                    "key matching: contact '{contact}' ({date_of_birth}) registered as both '{first}' and '{second}'"
                )
            }
            Self::AmbiguousFallback { name, tables } => {
                write!(
                    f,
                    "key matching: name '{name}' matches seating rows at tables {}",
                    tables.join(", ")
                )
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
