//! Command-line parsing for the declaration series builder.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the reshaping code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::DatasetSelection;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "decl", version, about = "Hourly energy declaration series builder (Energi Data Service)")]
pub struct Cli {
    /// More log output (debug).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Less log output (warnings only).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a year of declarations and write the published series files.
    Build(BuildArgs),
    /// Run the fuel pipeline and report hours whose shares don't sum to 1.
    Check(CheckArgs),
    /// Print the effective taxonomy, regions and interconnections.
    Taxonomy(ConfigArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    /// TOML file overriding the built-in schema (falls back to $DECL_CONFIG).
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    /// Calendar year to generate data for.
    pub year: i32,

    /// Which dataset(s) to build.
    #[arg(long, value_enum, default_value_t = DatasetSelection::All)]
    pub dataset: DatasetSelection,

    /// Directory receiving `<year>_fuel_data.json` / `<year>_emission_data.json`.
    #[arg(long, default_value = "data")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Read fuel records from a saved response instead of the API.
    #[arg(long, value_name = "JSON")]
    pub fuel_input: Option<PathBuf>,

    /// Read emission records from a saved response instead of the API.
    #[arg(long, value_name = "JSON")]
    pub emission_input: Option<PathBuf>,

    /// Keep full ISO timestamps instead of compact `YYMMDDHH`.
    #[arg(long)]
    pub iso_timestamps: bool,

    /// Pin every emission record to this region instead of its `PriceArea`.
    #[arg(long, value_name = "REGION")]
    pub emission_region: Option<String>,

    /// Also check that fuel shares sum to 1 per region-hour (warnings only).
    #[arg(long)]
    pub check_shares: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CheckArgs {
    /// Calendar year to check.
    pub year: i32,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Read fuel records from a saved response instead of the API.
    #[arg(long, value_name = "JSON")]
    pub fuel_input: Option<PathBuf>,

    /// Allowed deviation from 1 (overrides `share_tolerance`).
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Maximum number of deviating hours to list.
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}
