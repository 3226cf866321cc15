//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the reshaping code stays free of presentation
//! - output changes are localized

use crate::app::pipeline::{EmissionRun, FuelRun, RunSummary};
use crate::config::PipelineConfig;
use crate::domain::RegionAssignment;
use crate::reshape::ShareCheck;
use crate::reshape::timestamp::iso;

/// Format the fuel-mix run summary (including the share check when it ran).
pub fn format_fuel_summary(year: i32, run: &FuelRun, max_deviations: usize) -> String {
    let mut out = format_summary(year, &run.summary);
    if let Some(check) = &run.share_check {
        out.push('\n');
        out.push_str(&format_share_check(check, max_deviations));
    }
    out
}

pub fn format_emission_summary(year: i32, run: &EmissionRun) -> String {
    let mut out = format_summary(year, &run.summary);
    out.push_str(&format!("Metrics: {}\n", run.metrics.join(", ")));
    out
}

fn format_summary(year: i32, summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} {} ===\n", year, summary.kind.display_name()));
    out.push_str(&format!(
        "Records: {} | slots/hour: {} | points: {}\n",
        summary.records, summary.slots, summary.points
    ));
    for (region, hours) in &summary.region_hours {
        out.push_str(&format!("  {region:<6} {hours:>6} hours\n"));
    }
    out
}

/// Format the share-consistency report, listing at most `limit` deviating rows.
pub fn format_share_check(check: &ShareCheck, limit: usize) -> String {
    let mut out = String::new();
    if check.is_consistent() {
        out.push_str(&format!(
            "Share totals: OK ({} region-hours within ±{:e} of 1)\n",
            check.rows_checked, check.tolerance
        ));
        return out;
    }

    out.push_str(&format!(
        "Share totals: {} of {} region-hours deviate from 1 by more than {:e}\n",
        check.deviations.len(),
        check.rows_checked,
        check.tolerance
    ));
    out.push_str(&format!("{:<6} {:<20} {:>12} {:>12}\n", "region", "hour", "total", "delta"));
    out.push_str(&format!("{:-<6} {:-<20} {:-<12} {:-<12}\n", "", "", "", ""));
    for d in check.deviations.iter().take(limit) {
        out.push_str(&format!(
            "{:<6} {:<20} {:>12.6} {:>+12.6}\n",
            d.region,
            iso(d.hour),
            d.total,
            d.delta()
        ));
    }
    if check.deviations.len() > limit {
        out.push_str(&format!("... {} more\n", check.deviations.len() - limit));
    }
    out
}

/// Format the effective taxonomy and area lists.
pub fn format_taxonomy(config: &PipelineConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("Regions: {}\n", config.regions.join(", ")));
    out.push_str(&format!("Interconnections: {}\n", config.interconnections.join(", ")));
    out.push_str(&format!(
        "Emission region: {}\n",
        match &config.emission.region_assignment {
            RegionAssignment::FromRecord => format!("from '{}'", config.emission.region_field),
            RegionAssignment::Fixed(region) => format!("fixed {region}"),
        }
    ));
    out.push_str("\nTaxonomy:\n");
    for category in config.taxonomy.categories() {
        out.push_str(&format!(
            "  {category:<14} <- {}\n",
            config.taxonomy.raw_labels(category).join(", ")
        ));
    }
    out
}
