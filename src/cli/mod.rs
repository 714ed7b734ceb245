use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::Chamber;

pub mod formatters;

#[derive(Parser)]
#[command(name = "congress-control")]
#[command(
    version,
    about = "Record the party division of the House and Senate"
)]
#[command(
    long_about = "Fetch the House and Senate party-division pages, extract seat counts with the configured rule-sets, and write a small JSON snapshot for dashboards and badges. Meant to be run by a scheduler; exits non-zero on any fetch or parse failure."
)]
pub struct Cli {
    /// Path to a TOML config file (default: $CONGRESS_CONTROL_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch both chamber pages and rewrite the snapshot (default)
    Update(UpdateArgs),

    /// Run a chamber's rule-set against a saved page, without network access
    Extract {
        /// Which chamber's rule-set to apply
        #[arg(short, long, value_enum)]
        chamber: Chamber,

        /// Saved page (HTML or text)
        file: PathBuf,
    },

    /// Print the current snapshot and its consistency status
    Show {
        /// Snapshot file (default: configured output path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Default)]
pub struct UpdateArgs {
    /// House (lower chamber) source URL
    #[arg(long)]
    pub house_url: Option<String>,

    /// Senate (upper chamber) source URL
    #[arg(long)]
    pub senate_url: Option<String>,

    /// Snapshot file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Network timeout per request, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Fail instead of warning when counts do not add up to the chamber size
    #[arg(long)]
    pub strict: bool,

    /// Print the snapshot instead of writing it
    #[arg(short, long)]
    pub dry_run: bool,
}
