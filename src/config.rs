//! Pipeline configuration.
//!
//! Every list the reshaping depends on (regions, interconnections, the taxonomy
//! table, the emission identity fields) is data, not code. `PipelineConfig::default()`
//! matches the production schema of the declaration datasets; a TOML file can
//! override any subset of it:
//!
//! ```toml
//! regions = ["DK1", "DK2"]
//! interconnections = ["DK1", "DK2", "GE", "NO", "SE", "NL"]
//! timestamps = "compact"
//! share_tolerance = 1e-6
//!
//! [taxonomy]
//! Offshore = "Vind"
//! Onshore = "Vind"
//!
//! [emission]
//! unit_suffix = "PerkWh"
//! region_assignment = { fixed = "DK1" }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{RegionAssignment, TimestampMode};
use crate::error::{AppError, EXIT_CONFIG};
use crate::reshape::aggregate::area_code;
use crate::reshape::taxonomy::Taxonomy;

/// Environment variable naming a TOML config file (also read from `.env`).
pub const CONFIG_ENV: &str = "DECL_CONFIG";

const DEFAULT_REGIONS: [&str; 2] = ["DK1", "DK2"];
const DEFAULT_INTERCONNECTIONS: [&str; 6] = ["DK1", "DK2", "GE", "NO", "SE", "NL"];
const DEFAULT_IDENTITY_FIELDS: [&str; 6] = [
    "HourUTC",
    "HourDK",
    "PriceArea",
    "FuelAllocationMethod",
    "Edition",
    "CO2originPerkWh",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub regions: Vec<String>,
    /// Fuel pipeline only.
    pub interconnections: Vec<String>,
    pub taxonomy: Taxonomy,
    pub emission: EmissionSchema,
    pub timestamps: TimestampMode,
    /// Allowed deviation of an hour's share total from 1.
    pub share_tolerance: f64,
}

/// Field conventions of the emission dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionSchema {
    pub hour_field: String,
    pub region_field: String,
    /// Non-metric fields; the hour and region fields are always treated as identity.
    pub identity_fields: Vec<String>,
    /// Unit suffix carried by every metric field (`CO2PerkWh` → `CO2`).
    pub unit_suffix: String,
    pub region_assignment: RegionAssignment,
}

impl Default for EmissionSchema {
    fn default() -> Self {
        EmissionSchema {
            hour_field: "HourUTC".to_string(),
            region_field: "PriceArea".to_string(),
            identity_fields: DEFAULT_IDENTITY_FIELDS.iter().map(|s| s.to_string()).collect(),
            unit_suffix: "PerkWh".to_string(),
            region_assignment: RegionAssignment::FromRecord,
        }
    }
}

impl EmissionSchema {
    pub fn is_identity(&self, field: &str) -> bool {
        field == self.hour_field || field == self.region_field || self.identity_fields.iter().any(|f| f == field)
    }

    /// Source field name for a canonical metric.
    pub fn field_for(&self, metric: &str) -> String {
        format!("{metric}{}", self.unit_suffix)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            regions: DEFAULT_REGIONS.iter().map(|s| s.to_string()).collect(),
            interconnections: DEFAULT_INTERCONNECTIONS.iter().map(|s| s.to_string()).collect(),
            taxonomy: Taxonomy::default(),
            emission: EmissionSchema::default(),
            timestamps: TimestampMode::Compact,
            share_tolerance: 1e-6,
        }
    }
}

/// On-disk overlay; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    regions: Option<Vec<String>>,
    interconnections: Option<Vec<String>>,
    taxonomy: Option<Taxonomy>,
    emission: Option<EmissionFile>,
    timestamps: Option<TimestampMode>,
    share_tolerance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct EmissionFile {
    hour_field: Option<String>,
    region_field: Option<String>,
    identity_fields: Option<Vec<String>>,
    unit_suffix: Option<String>,
    region_assignment: Option<RegionAssignment>,
}

impl PipelineConfig {
    /// Load the configuration.
    ///
    /// Resolution order: explicit `path`, then `$DECL_CONFIG` (after loading `.env`),
    /// then built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let resolved: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match resolved {
            Some(p) => Self::from_file(&p),
            None => {
                tracing::debug!("no config file; using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(EXIT_CONFIG, format!("Failed to read config '{}': {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| AppError::new(EXIT_CONFIG, format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| AppError::new(EXIT_CONFIG, format!("Invalid config: {e}")))?;
        let mut config = Self::default();
        config.apply(file);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(v) = file.regions {
            self.regions = v;
        }
        if let Some(v) = file.interconnections {
            self.interconnections = v;
        }
        if let Some(v) = file.taxonomy {
            self.taxonomy = v;
        }
        if let Some(v) = file.timestamps {
            self.timestamps = v;
        }
        if let Some(v) = file.share_tolerance {
            self.share_tolerance = v;
        }
        if let Some(e) = file.emission {
            let schema = &mut self.emission;
            if let Some(v) = e.hour_field {
                schema.hour_field = v;
            }
            if let Some(v) = e.region_field {
                schema.region_field = v;
            }
            if let Some(v) = e.identity_fields {
                schema.identity_fields = v;
            }
            if let Some(v) = e.unit_suffix {
                schema.unit_suffix = v;
            }
            if let Some(v) = e.region_assignment {
                schema.region_assignment = v;
            }
        }
        self.regions = self.regions.iter().map(|r| area_code(r)).collect();
        self.interconnections = self.interconnections.iter().map(|r| area_code(r)).collect();
        if let RegionAssignment::Fixed(region) = &self.emission.region_assignment {
            self.emission.region_assignment = RegionAssignment::Fixed(area_code(region));
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        let bad = |msg: String| Err(AppError::new(EXIT_CONFIG, format!("Invalid config: {msg}")));

        if self.regions.is_empty() {
            return bad("`regions` must not be empty".to_string());
        }
        if self.interconnections.is_empty() {
            return bad("`interconnections` must not be empty".to_string());
        }
        if let Some(dup) = first_duplicate(&self.regions) {
            return bad(format!("region '{dup}' listed twice"));
        }
        if let Some(dup) = first_duplicate(&self.interconnections) {
            return bad(format!("interconnection '{dup}' listed twice"));
        }
        if self.taxonomy.is_empty() {
            return bad("`taxonomy` must map at least one label".to_string());
        }
        if self.emission.unit_suffix.is_empty() {
            return bad("`emission.unit_suffix` must not be empty".to_string());
        }
        if !(self.share_tolerance.is_finite() && self.share_tolerance >= 0.0) {
            return bad(format!("`share_tolerance` must be >= 0 (got {})", self.share_tolerance));
        }
        if let RegionAssignment::Fixed(region) = &self.emission.region_assignment {
            if !self.regions.contains(region) {
                return bad(format!("fixed emission region '{region}' is not in `regions`"));
            }
        }
        Ok(())
    }
}

fn first_duplicate(values: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    values.iter().find(|v| !seen.insert(v.as_str())).map(String::as_str)
}
