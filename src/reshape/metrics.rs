//! Emission metric discovery.
//!
//! The emission dataset has no fixed metric list: every non-identity field of a
//! record is a metric named `<metric><unit suffix>` (`CO2PerkWh`, `NOxPerkWh`, ...).
//! The metric set is read off one sample record.

use crate::config::EmissionSchema;
use crate::domain::EmissionRecord;
use crate::error::PipelineError;

/// Metric names carried by `sample`, suffix stripped, in source field order.
pub fn derive_metrics(sample: &EmissionRecord, schema: &EmissionSchema) -> Result<Vec<String>, PipelineError> {
    let mut metrics = Vec::new();
    for field in sample.field_names().filter(|f| !schema.is_identity(f)) {
        let metric = field
            .strip_suffix(schema.unit_suffix.as_str())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                PipelineError::schema(format!(
                    "field '{field}' is neither an identity field nor a '*{}' metric",
                    schema.unit_suffix
                ))
            })?;
        metrics.push(metric.to_string());
    }

    if metrics.is_empty() {
        return Err(PipelineError::schema("sample record carries no metric fields"));
    }
    Ok(metrics)
}

/// Discover metrics from the first record of `records`.
pub fn discover_metrics(records: &[EmissionRecord], schema: &EmissionSchema) -> Result<Vec<String>, PipelineError> {
    let sample = records
        .first()
        .ok_or_else(|| PipelineError::schema("no sample record to discover metrics from"))?;
    let metrics = derive_metrics(sample, schema)?;
    tracing::info!(metrics = %metrics.join(","), "discovered emission metrics");
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: serde_json::Value) -> EmissionRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn strips_unit_suffix() {
        let sample = record(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK1", "CO2PerkWh": 123, "SO2PerkWh": 4}));
        let metrics = derive_metrics(&sample, &EmissionSchema::default()).unwrap();
        assert_eq!(metrics, vec!["CO2", "SO2"]);
    }

    #[test]
    fn identity_fields_are_skipped() {
        let sample = record(json!({
            "HourUTC": "2019-01-01T00:00",
            "HourDK": "2019-01-01T01:00",
            "PriceArea": "DK1",
            "FuelAllocationMethod": "125%",
            "Edition": "Production",
            "CO2originPerkWh": 200,
            "CO2PerkWh": 150,
            "NOxPerkWh": 0.2
        }));
        let metrics = derive_metrics(&sample, &EmissionSchema::default()).unwrap();
        assert_eq!(metrics, vec!["CO2", "NOx"]);
    }

    #[test]
    fn unsuffixed_field_is_schema_mismatch() {
        let sample = record(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK1", "CO2PerkWh": 1, "Version": 3}));
        let err = derive_metrics(&sample, &EmissionSchema::default()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { ref detail } if detail.contains("Version")));
    }

    #[test]
    fn bare_suffix_is_not_a_metric() {
        let sample = record(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK1", "PerkWh": 1}));
        assert!(derive_metrics(&sample, &EmissionSchema::default()).is_err());
    }

    #[test]
    fn identity_only_sample_is_schema_mismatch() {
        let sample = record(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK1"}));
        assert!(derive_metrics(&sample, &EmissionSchema::default()).is_err());
    }

    #[test]
    fn empty_records_have_no_sample() {
        let err = discover_metrics(&[], &EmissionSchema::default()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn custom_suffix() {
        let schema = EmissionSchema {
            unit_suffix: "_g_per_kwh".to_string(),
            ..EmissionSchema::default()
        };
        let sample = record(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK1", "co2_g_per_kwh": 1}));
        assert_eq!(derive_metrics(&sample, &schema).unwrap(), vec!["co2"]);
    }
}
