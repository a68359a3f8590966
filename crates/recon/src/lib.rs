//! `roster-recon`: registration and seating-chart reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns the consolidated
//! roster. No CLI or file IO dependencies.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod model;
pub mod records;
pub mod table;

pub use config::ReconConfig;
pub use engine::{reconcile, run, select_sheet};
pub use error::{ErrorKind, ReconError};
pub use extract::{extract, extract_names};
pub use model::{ReconInput, Roster, RosterRow, RosterSummary};
pub use table::{CellValue, Table};
