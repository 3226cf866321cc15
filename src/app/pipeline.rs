//! Shared pipeline logic used by the `build` and `check` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! records -> (taxonomy) -> accumulator -> series (+ share check)
//!
//! `run_fuel` / `run_emission` are pure; `fetch_*` wrap them around a `RecordSource`.

use crate::config::PipelineConfig;
use crate::data::RecordSource;
use crate::domain::{DatasetKind, EmissionRecord, EmissionSeries, FuelRecord, FuelSeries, RunOutcome};
use crate::error::{AppError, PipelineError};
use crate::reshape::{
    ShareCheck, aggregate_emission, aggregate_fuel, build_emission_series, build_fuel_series, check_share_totals,
    discover_metrics,
};

/// Counts describing one built dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub kind: DatasetKind,
    pub records: usize,
    /// `(region, hours seen)` in region order.
    pub region_hours: Vec<(String, usize)>,
    pub slots: usize,
    pub points: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuelRun {
    pub series: FuelSeries,
    pub summary: RunSummary,
    pub share_check: Option<ShareCheck>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRun {
    pub series: EmissionSeries,
    pub metrics: Vec<String>,
    pub summary: RunSummary,
}

/// Reshape fuel-mix records.
///
/// With `check_shares`, every `(region, hour)` total is compared against 1 using
/// `config.share_tolerance`; deviations are reported, not fatal.
pub fn run_fuel(
    records: &[FuelRecord],
    config: &PipelineConfig,
    check_shares: bool,
) -> Result<RunOutcome<FuelRun>, PipelineError> {
    if records.is_empty() {
        return Ok(RunOutcome::Empty);
    }

    let acc = aggregate_fuel(records, config)?;
    let share_check = check_shares.then(|| check_share_totals(&acc, config.share_tolerance));
    let series = build_fuel_series(&acc, config.timestamps);

    let summary = RunSummary {
        kind: DatasetKind::Fuel,
        records: records.len(),
        region_hours: acc.regions().map(|(r, hours)| (r.to_string(), hours.len())).collect(),
        slots: acc.slots().len(),
        points: series.point_count(),
    };
    Ok(RunOutcome::Built(FuelRun {
        series,
        summary,
        share_check,
    }))
}

/// Reshape emission records; metrics are discovered from the first record.
pub fn run_emission(
    records: &[EmissionRecord],
    config: &PipelineConfig,
) -> Result<RunOutcome<EmissionRun>, PipelineError> {
    if records.is_empty() {
        return Ok(RunOutcome::Empty);
    }

    let metrics = discover_metrics(records, &config.emission)?;
    let acc = aggregate_emission(records, &metrics, config)?;
    let series = build_emission_series(&acc, config.timestamps);

    let summary = RunSummary {
        kind: DatasetKind::Emission,
        records: records.len(),
        region_hours: acc.regions().map(|(r, hours)| (r.to_string(), hours.len())).collect(),
        slots: acc.slots().len(),
        points: series.point_count(),
    };
    Ok(RunOutcome::Built(EmissionRun {
        series,
        metrics,
        summary,
    }))
}

/// Fetch one year of fuel records and reshape them.
pub fn fetch_fuel(
    source: &dyn RecordSource,
    year: i32,
    config: &PipelineConfig,
    check_shares: bool,
) -> Result<RunOutcome<FuelRun>, AppError> {
    let records = source.fetch_fuel(year)?;
    Ok(run_fuel(&records, config, check_shares)?)
}

/// Fetch one year of emission records and reshape them.
pub fn fetch_emission(
    source: &dyn RecordSource,
    year: i32,
    config: &PipelineConfig,
) -> Result<RunOutcome<EmissionRun>, AppError> {
    let records = source.fetch_emission(year)?;
    Ok(run_emission(&records, config)?)
}
