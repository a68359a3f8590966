//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (unspecified)                         |
//! | 2    | CLI usage error (bad args, missing path)            |
//! | 3    | Configuration (bad config, missing sheet or column) |
//! | 4    | Data integrity (mixed key types, conflicting names) |
//! | 5    | Output could not be written                         |
//! | 6    | Ambiguous name fallback with `fail_on_ambiguous`    |

use roster_recon::{ErrorKind, ReconError};

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file unreadable or invalid, input file unreadable, registration
/// sheet or required column missing.
pub const EXIT_CONFIG: u8 = 3;

/// Input data cannot be reconciled safely.
pub const EXIT_DATA: u8 = 4;

/// Consolidated or filtered output could not be written.
pub const EXIT_OUTPUT_IO: u8 = 5;

/// A name fallback matched several tables and `fail_on_ambiguous` is set.
pub const EXIT_AMBIGUOUS: u8 = 6;

/// Map an engine or load error to its exit code. I/O here means reading
/// inputs; write failures are mapped at the call site.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::AmbiguousFallback { .. } => EXIT_AMBIGUOUS,
        _ => match err.kind() {
            ErrorKind::Configuration | ErrorKind::Io => EXIT_CONFIG,
            ErrorKind::DataIntegrity => EXIT_DATA,
        },
    }
}
