// roster CLI - reconcile convention registrations with the banquet seating chart

mod commands;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;

use exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_OUTPUT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Consolidate paid convention registrations with the seating chart")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the consolidated roster (and optional filtered extract)
    #[command(after_help = "\
Examples:
  roster run convention.toml
  roster run convention.toml --json
  roster run --registrations regs.xlsx --seating seating.xlsx --output roster.xlsx
  roster run convention.toml --extract-output vip.xlsx --name 'Ann Lee' --name 'Bo Kim'")]
    Run {
        /// TOML config; relative paths inside it resolve against its directory
        #[arg(env = "ROSTER_CONFIG")]
        config: Option<PathBuf>,

        /// Registration workbook (overrides registrations.file)
        #[arg(long, env = "ROSTER_REGISTRATIONS")]
        registrations: Option<PathBuf>,

        /// Seating chart (overrides seating.file)
        #[arg(long, env = "ROSTER_SEATING")]
        seating: Option<PathBuf>,

        /// Consolidated roster output, .xlsx or .csv (overrides output.roster)
        #[arg(long, short = 'o', env = "ROSTER_OUTPUT")]
        output: Option<PathBuf>,

        /// Filtered extract output (overrides output.extract)
        #[arg(long, env = "ROSTER_EXTRACT_OUTPUT")]
        extract_output: Option<PathBuf>,

        /// Name to extract. Repeatable; replaces extract.names from the config.
        #[arg(long = "name", value_name = "NAME")]
        names: Vec<String>,

        /// Substring identifying the registration sheet
        #[arg(long, env = "ROSTER_SHEET_MARKER")]
        sheet_marker: Option<String>,

        /// Fail when a name fallback hits several tables
        #[arg(long)]
        fail_on_ambiguous: bool,

        /// Keep mis-encoded punctuation as read
        #[arg(long)]
        no_repair_text: bool,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Filter an existing roster down to the given names
    #[command(after_help = "\
Examples:
  roster extract roster.xlsx --name 'Ann Lee' --output ann.xlsx
  roster extract roster.csv --name 'Ann Lee' --name 'Bo Kim' -o pair.csv")]
    Extract {
        /// Consolidated roster (.xlsx or .csv)
        input: PathBuf,

        /// Name to keep. Repeatable; none writes a header-only file.
        #[arg(long = "name", value_name = "NAME")]
        names: Vec<String>,

        /// Column holding the names
        #[arg(long, default_value = "Existing Contact")]
        column: String,

        /// Output file
        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  roster validate convention.toml")]
    Validate {
        /// Path to the TOML config
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            registrations,
            seating,
            output,
            extract_output,
            names,
            sheet_marker,
            fail_on_ambiguous,
            no_repair_text,
            json,
        } => commands::cmd_run(commands::RunArgs {
            config,
            registrations,
            seating,
            output,
            extract_output,
            names,
            sheet_marker,
            fail_on_ambiguous,
            repair_text: !no_repair_text,
            json,
        }),
        Commands::Extract { input, names, column, output } => {
            commands::cmd_extract(input, names, column, output)
        }
        Commands::Validate { config } => commands::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT_IO, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Error from loading or reconciling, with a hint where one helps.
    pub fn recon(err: roster_recon::ReconError) -> Self {
        use roster_recon::ReconError;

        let hint = match &err {
            ReconError::MissingSheet { .. } => {
                Some("set registrations.sheet_marker or pass --sheet-marker".to_string())
            }
            ReconError::MissingColumn { .. } => {
                Some("map the column under registrations.columns or seating.columns".to_string())
            }
            ReconError::MixedKeyTypes { .. } => {
                Some("format the column the same way in both files (all text or all dates)".to_string())
            }
            ReconError::AmbiguousFallback { .. } => {
                Some("fix the attendee's birth date in one file so the exact match succeeds".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
