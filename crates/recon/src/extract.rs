use std::collections::BTreeSet;

use crate::config::RegistrationColumns;
use crate::error::ReconError;
use crate::table::Table;

/// Rows whose identity cell exactly equals one of `names`, in table order.
/// An empty name set yields an empty table with the same headers.
pub fn extract(
    table: &Table,
    identity_column: &str,
    names: &BTreeSet<String>,
) -> Result<Table, ReconError> {
    let mut out = table.empty_like();
    if names.is_empty() {
        return Ok(out);
    }

    let idx = table.require_column(identity_column)?;
    out.rows = table
        .rows
        .iter()
        .filter(|row| {
            row.get(idx)
                .and_then(|c| c.as_ref())
                .is_some_and(|c| names.contains(&c.to_string()))
        })
        .cloned()
        .collect();

    log::info!(
        "extracted {} of {} rows for {} names",
        out.len(),
        table.len(),
        names.len()
    );

    Ok(out)
}

/// `extract` on the default contact column.
pub fn extract_names(table: &Table, names: &BTreeSet<String>) -> Result<Table, ReconError> {
    extract(table, &RegistrationColumns::default().contact, names)
}
