//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - deserialized straight from the data source's JSON records
//! - carried through the reshaping pipeline
//! - serialized unchanged by the sink

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The two declaration datasets the pipeline knows how to reshape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Fuel,
    Emission,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Fuel, DatasetKind::Emission];

    /// Dataset name on the source API.
    pub fn source_dataset(self) -> &'static str {
        match self {
            DatasetKind::Fuel => "DeclarationCoverageHour",
            DatasetKind::Emission => "DeclarationEmissionHour",
        }
    }

    /// Suffix of the published file name (`<year>_<stem>.json`).
    pub fn file_stem(self) -> &'static str {
        match self {
            DatasetKind::Fuel => "fuel_data",
            DatasetKind::Emission => "emission_data",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DatasetKind::Fuel => "fuel mix",
            DatasetKind::Emission => "emission factors",
        }
    }
}

/// Which dataset(s) a `decl build` run should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatasetSelection {
    All,
    Fuel,
    Emission,
}

impl DatasetSelection {
    pub fn kinds(self) -> &'static [DatasetKind] {
        match self {
            DatasetSelection::All => &DatasetKind::ALL,
            DatasetSelection::Fuel => &[DatasetKind::Fuel],
            DatasetSelection::Emission => &[DatasetKind::Emission],
        }
    }
}

/// How hour keys are written into the published series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampMode {
    /// Fixed-width numeric `YYMMDDHH` (e.g. `19010100`).
    #[default]
    Compact,
    /// Normalized ISO string `YYYY-MM-DDTHH:00:00Z`.
    Iso,
}

/// Where an emission record's region comes from.
///
/// Some historical exports pinned every emission row to one area regardless of the
/// `PriceArea` field; `Fixed` reproduces that when it is wanted.
///
/// `Fixed` assumes single-area input. Rows from several areas at the same hour are
/// summed into the pinned region, which is meaningless for intensities (g/kWh), and
/// the run logs a warning when that happens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionAssignment {
    #[default]
    FromRecord,
    Fixed(String),
}

/// One fuel-mix row from `DeclarationCoverageHour`.
///
/// Field-name casing has drifted between source editions, hence the aliases.
/// Fields not listed here (`HourDK`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelRecord {
    #[serde(rename = "HourUTC", alias = "hourUTC", alias = "HourUtc")]
    pub hour: String,
    #[serde(rename = "PriceArea", alias = "priceArea")]
    pub region: String,
    #[serde(rename = "ConnectedArea", alias = "connectedArea")]
    pub interconnection: String,
    #[serde(rename = "ProductionGroup", alias = "productionGroup")]
    pub raw_category: String,
    #[serde(rename = "Share", alias = "share")]
    pub share: f64,
}

/// One emission row from `DeclarationEmissionHour`.
///
/// The metric columns are not known ahead of time, so the record is kept as the
/// source's JSON object (in source field order).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmissionRecord(pub Map<String, Value>);

impl EmissionRecord {
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }
}

/// Time key of a published point.
///
/// A run uses a single [`TimestampMode`], so a series never mixes variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesTime {
    Compact(u32),
    Iso(String),
}

/// Points that carry a [`SeriesTime`]; used to sort series generically.
pub trait TimedPoint {
    fn time(&self) -> &SeriesTime;
}

/// Fuel-mix point: `{"T": <time>, "S": <share>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharePoint {
    #[serde(rename = "T")]
    pub t: SeriesTime,
    #[serde(rename = "S")]
    pub s: f64,
}

impl TimedPoint for SharePoint {
    fn time(&self) -> &SeriesTime {
        &self.t
    }
}

/// Emission point: `{"T": <time>, "P": <value>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionPoint {
    #[serde(rename = "T")]
    pub t: SeriesTime,
    #[serde(rename = "P")]
    pub p: f64,
}

impl TimedPoint for EmissionPoint {
    fn time(&self) -> &SeriesTime {
        &self.t
    }
}

/// Published fuel-mix structure: region → category → interconnection → points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuelSeries {
    pub regions: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<SharePoint>>>>,
}

impl FuelSeries {
    pub fn series(&self, region: &str, category: &str, interconnection: &str) -> Option<&[SharePoint]> {
        self.regions
            .get(region)?
            .get(category)?
            .get(interconnection)
            .map(Vec::as_slice)
    }

    /// Iterate `(region, category, interconnection, points)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str, &[SharePoint])> {
        self.regions.iter().flat_map(|(region, categories)| {
            categories.iter().flat_map(move |(category, links)| {
                links
                    .iter()
                    .map(move |(link, points)| (region.as_str(), category.as_str(), link.as_str(), points.as_slice()))
            })
        })
    }

    pub fn point_count(&self) -> usize {
        self.iter().map(|(_, _, _, points)| points.len()).sum()
    }
}

/// Published emission structure: region → metric → points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmissionSeries {
    pub regions: BTreeMap<String, BTreeMap<String, Vec<EmissionPoint>>>,
}

impl EmissionSeries {
    pub fn series(&self, region: &str, metric: &str) -> Option<&[EmissionPoint]> {
        self.regions.get(region)?.get(metric).map(Vec::as_slice)
    }

    /// Iterate `(region, metric, points)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[EmissionPoint])> {
        self.regions.iter().flat_map(|(region, metrics)| {
            metrics
                .iter()
                .map(move |(metric, points)| (region.as_str(), metric.as_str(), points.as_slice()))
        })
    }

    pub fn point_count(&self) -> usize {
        self.iter().map(|(_, _, points)| points.len()).sum()
    }
}

/// Result of a pipeline run.
///
/// An empty input is a normal, terminal outcome: nothing downstream runs and
/// nothing is written.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    Empty,
    Built(T),
}

impl<T> RunOutcome<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, RunOutcome::Empty)
    }

    pub fn built(self) -> Option<T> {
        match self {
            RunOutcome::Empty => None,
            RunOutcome::Built(v) => Some(v),
        }
    }
}
