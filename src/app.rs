//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - resolves the pipeline configuration
//! - retrieves records (API or saved files)
//! - runs the fuel / emission pipelines
//! - prints summaries and writes the series files

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::{BuildArgs, CheckArgs, Command, ConfigArgs};
use crate::config::PipelineConfig;
use crate::data::{EdsClient, JsonFileSource, RecordSource};
use crate::domain::{DatasetKind, RegionAssignment, RunOutcome, TimestampMode};
use crate::error::AppError;
use crate::io::{JsonDirSink, SeriesSink};
use pipeline::{EmissionRun, FuelRun};
use crate::reshape::aggregate::area_code;

pub mod pipeline;

/// Deviating hours listed after `build --check-shares`.
const BUILD_DEVIATION_LIMIT: usize = 10;

/// Entry point for the `decl` binary.
pub fn run() -> Result<(), AppError> {
    // `decl 2019` is shorthand for `decl build 2019`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    crate::logging::init_logging(level);

    match cli.command {
        Command::Build(args) => handle_build(args),
        Command::Check(args) => handle_check(args),
        Command::Taxonomy(args) => handle_taxonomy(args),
    }
}

fn handle_build(args: BuildArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args)?;
    let year = args.year;
    let kinds = args.dataset.kinds();

    // Retrieve everything before reshaping anything: if any requested dataset is
    // empty for the year, nothing is written.
    let fuel_records = if kinds.contains(&DatasetKind::Fuel) {
        Some(source_for(args.fuel_input.as_deref()).fetch_fuel(year)?)
    } else {
        None
    };
    let emission_records = if kinds.contains(&DatasetKind::Emission) {
        Some(source_for(args.emission_input.as_deref()).fetch_emission(year)?)
    } else {
        None
    };
    if fuel_records.as_ref().is_some_and(Vec::is_empty) || emission_records.as_ref().is_some_and(Vec::is_empty) {
        report_empty(year);
        return Ok(());
    }

    // Build every structure before the first write so a failure leaves no files behind.
    let fuel_run = match &fuel_records {
        Some(records) => match pipeline::run_fuel(records, &config, args.check_shares)? {
            RunOutcome::Built(run) => Some(run),
            RunOutcome::Empty => {
                report_empty(year);
                return Ok(());
            }
        },
        None => None,
    };
    let emission_run = match &emission_records {
        Some(records) => match pipeline::run_emission(records, &config)? {
            RunOutcome::Built(run) => Some(run),
            RunOutcome::Empty => {
                report_empty(year);
                return Ok(());
            }
        },
        None => None,
    };

    if let Some(run) = &emission_run {
        println!("{}", crate::report::format_emission_summary(year, run));
    }
    if let Some(run) = &fuel_run {
        println!("{}", crate::report::format_fuel_summary(year, run, BUILD_DEVIATION_LIMIT));
    }

    let sink = JsonDirSink::new(&args.out_dir, args.pretty);
    publish(&sink, year, emission_run.as_ref(), fuel_run.as_ref())?;
    Ok(())
}

/// Write the built series; a failed write removes the files this call already wrote.
fn publish<S: SeriesSink>(
    sink: &S,
    year: i32,
    emission: Option<&EmissionRun>,
    fuel: Option<&FuelRun>,
) -> Result<Vec<PathBuf>, AppError> {
    let mut written = Vec::new();
    if let Err(err) = write_each(sink, year, emission, fuel, &mut written) {
        for path in &written {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %e, "could not remove partial output");
            }
        }
        return Err(err);
    }
    Ok(written)
}

fn write_each<S: SeriesSink>(
    sink: &S,
    year: i32,
    emission: Option<&EmissionRun>,
    fuel: Option<&FuelRun>,
    written: &mut Vec<PathBuf>,
) -> Result<(), AppError> {
    if let Some(run) = emission {
        written.push(sink.write(year, DatasetKind::Emission, &run.series)?);
    }
    if let Some(run) = fuel {
        written.push(sink.write(year, DatasetKind::Fuel, &run.series)?);
    }
    Ok(())
}

fn handle_check(args: CheckArgs) -> Result<(), AppError> {
    let mut config = load_config(&args.config)?;
    if let Some(tolerance) = args.tolerance {
        config.share_tolerance = tolerance;
        config.validate()?;
    }

    let source = source_for(args.fuel_input.as_deref());
    match pipeline::fetch_fuel(source.as_ref(), args.year, &config, true)? {
        RunOutcome::Empty => report_empty(args.year),
        RunOutcome::Built(run) => {
            println!("{}", crate::report::format_fuel_summary(args.year, &run, args.top));
        }
    }
    Ok(())
}

fn handle_taxonomy(args: ConfigArgs) -> Result<(), AppError> {
    let config = load_config(&args)?;
    print!("{}", crate::report::format_taxonomy(&config));
    Ok(())
}

fn report_empty(year: i32) {
    tracing::info!(year, "no records returned; nothing written");
    println!("\nNo data found for {year}\n");
}

fn load_config(args: &ConfigArgs) -> Result<PipelineConfig, AppError> {
    PipelineConfig::load(args.config.as_deref())
}

/// Resolve the config file, then apply `build` flag overrides on top.
pub fn pipeline_config_from_args(args: &BuildArgs) -> Result<PipelineConfig, AppError> {
    apply_build_flags(load_config(&args.config)?, args)
}

fn apply_build_flags(mut config: PipelineConfig, args: &BuildArgs) -> Result<PipelineConfig, AppError> {
    if args.iso_timestamps {
        config.timestamps = TimestampMode::Iso;
    }
    if let Some(region) = &args.emission_region {
        config.emission.region_assignment = RegionAssignment::Fixed(area_code(region));
    }
    config.validate()?;
    Ok(config)
}

fn source_for(input: Option<&Path>) -> Box<dyn RecordSource> {
    match input {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(EdsClient::from_env()),
    }
}

/// Rewrite argv so a bare year means `build`.
///
/// Rules:
/// - `decl 2019 ...`            -> `decl build 2019 ...`
/// - `decl -v 2019 ...`         -> `decl -v build 2019 ...`
/// - anything else              -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let first_positional = argv
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, arg)| !matches!(arg.as_str(), "-v" | "--verbose" | "-q" | "--quiet"))
        .map(|(i, arg)| (i, arg.clone()));

    if let Some((index, arg)) = first_positional {
        if arg.parse::<i32>().is_ok() {
            argv.insert(index, "build".to_string());
        }
    }
    argv
}
