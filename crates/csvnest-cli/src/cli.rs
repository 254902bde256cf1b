//! CLI argument definitions using clap.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// csvnest: rule-driven CSV typing, validation and nested-key grouping
#[derive(Parser)]
#[command(name = "csvnest")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a CSV file and print the nested result as JSON
    Parse {
        /// Path to the CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON file with "rules" and "options"
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,

        /// Write even if validation failed
        #[arg(long)]
        force: bool,
    },

    /// Validate a CSV file and show per-cell verdicts
    Check {
        /// Path to the CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON file with "rules" and "options"
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}
