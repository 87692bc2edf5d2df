//! `tally` command-line interface.
//!
//! Thin shell over the `tally-recon` engine: loads config and input
//! files from disk, runs the engine, and renders reports. All file and
//! process concerns live here so the engine stays pure.

mod exit_codes;
mod parse;
mod run;
mod validate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tally_recon::ReconError;

use exit_codes::{
    EXIT_IO, EXIT_PARSE, EXIT_RECON_INVALID_CONFIG, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Reconcile carrier commission statements against an enrollment ledger")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full reconciliation from a TOML config
    #[command(after_help = "\
Examples:
  tally run recon.toml
  tally run recon.toml --json
  tally run recon.toml --output report.json
  tally run recon.toml --statement-date 2025-02-01
  tally run recon.toml --notify")]
    Run {
        /// Path to the recon config (TOML)
        config: PathBuf,

        /// Print the full report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Override every carrier's statement date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        statement_date: Option<String>,

        /// Print an email-style notification to stdout
        #[arg(long)]
        notify: bool,
    },

    /// Parse one carrier document and print the extracted records
    #[command(after_help = "\
Examples:
  tally parse statements/hne_feb.json --carrier hne --config recon.toml")]
    Parse {
        /// Path to the extraction document (chunked JSON)
        document: PathBuf,

        /// Carrier code the document belongs to
        #[arg(long, value_name = "CODE")]
        carrier: String,

        /// Path to the recon config (TOML)
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Check a recon config without running it
    Validate {
        /// Path to the recon config (TOML)
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, json, output, statement_date, notify } => {
            run::cmd_run(&config, json, output.as_deref(), statement_date.as_deref(), notify)
        }
        Commands::Parse { document, carrier, config } => {
            parse::cmd_parse(&document, &carrier, &config)
        }
        Commands::Validate { config } => validate::cmd_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {hint}");
            }
            ExitCode::from(code)
        }
    }
}

/// A CLI failure: exit code plus what to print on stderr.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: message.into(), hint: None }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: message.into(), hint: None }
    }

    /// Map an engine error onto the exit code registry.
    pub fn recon(err: ReconError) -> Self {
        let code = match &err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                EXIT_RECON_INVALID_CONFIG
            }
            ReconError::UnknownCarrier(_) => EXIT_USAGE,
            ReconError::DocumentDecode(_) | ReconError::LedgerColumn { .. } => EXIT_PARSE,
            ReconError::Io(_) => EXIT_IO,
        };
        Self { code, message: err.to_string(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
