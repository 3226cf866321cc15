//! Intermediate accumulation: `region → hour → slot → value`.
//!
//! The accumulator is rectangular. The first time an hour is seen for a region,
//! every slot of the configured cross product is created with `0.0`; records then
//! **add** into their slot. Several raw rows collapsing onto one slot (`Offshore`
//! and `Onshore` both become `Vind`) therefore sum instead of overwriting.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::config::{EmissionSchema, PipelineConfig};
use crate::domain::{EmissionRecord, FuelRecord, RegionAssignment};
use crate::error::PipelineError;
use crate::reshape::taxonomy::Taxonomy;
use crate::reshape::timestamp::parse_hour;

/// Fuel slot: `(canonical category, interconnection)`.
pub type FuelSlot = (String, String);

pub type FuelAccumulator = Accumulator<FuelSlot>;
pub type EmissionAccumulator = Accumulator<String>;

/// One `(region, hour)` row: slot → accumulated value.
pub type HourSlots<K> = BTreeMap<K, f64>;

/// Why a value could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    Region,
    Slot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator<K: Ord> {
    slots: Vec<K>,
    regions: BTreeMap<String, BTreeMap<NaiveDateTime, HourSlots<K>>>,
}

impl<K: Ord + Clone> Accumulator<K> {
    /// Empty accumulator over `regions` with the slot template `slots`.
    ///
    /// Every region is present from the start, even if no record ever names it.
    pub fn new(regions: &[String], slots: Vec<K>) -> Self {
        Accumulator {
            slots,
            regions: regions.iter().map(|r| (r.clone(), BTreeMap::new())).collect(),
        }
    }

    /// Add `value` into `(region, hour, slot)`, creating the full hour row on first sight.
    pub fn add(&mut self, region: &str, hour: NaiveDateTime, slot: &K, value: f64) -> Result<(), Rejected> {
        if !self.slots.contains(slot) {
            return Err(Rejected::Slot);
        }
        let hours = self.regions.get_mut(region).ok_or(Rejected::Region)?;
        let row = hours
            .entry(hour)
            .or_insert_with(|| self.slots.iter().map(|s| (s.clone(), 0.0)).collect());
        // The row was built from the full template, so the slot is present.
        if let Some(cell) = row.get_mut(slot) {
            *cell += value;
        }
        Ok(())
    }

    pub fn slots(&self) -> &[K] {
        &self.slots
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &BTreeMap<NaiveDateTime, HourSlots<K>>)> {
        self.regions.iter().map(|(r, hours)| (r.as_str(), hours))
    }

    pub fn hours(&self, region: &str) -> Option<&BTreeMap<NaiveDateTime, HourSlots<K>>> {
        self.regions.get(region)
    }

    pub fn value(&self, region: &str, hour: NaiveDateTime, slot: &K) -> Option<f64> {
        self.regions.get(region)?.get(&hour)?.get(slot).copied()
    }

    /// Number of `(region, hour)` rows.
    pub fn row_count(&self) -> usize {
        self.regions.values().map(BTreeMap::len).sum()
    }
}

/// Upper-cased, trimmed area code (`" dk1"` → `"DK1"`).
pub fn area_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Slot template for the fuel pipeline: categories × interconnections.
pub fn fuel_slots(taxonomy: &Taxonomy, interconnections: &[String]) -> Vec<FuelSlot> {
    taxonomy
        .categories()
        .into_iter()
        .flat_map(|c| interconnections.iter().map(move |i| (c.to_string(), i.clone())))
        .collect()
}

/// Accumulate fuel-mix records.
///
/// Fails on the first record whose label, region, interconnection or hour is not
/// recognized; no partial accumulator is returned.
pub fn aggregate_fuel(records: &[FuelRecord], config: &PipelineConfig) -> Result<FuelAccumulator, PipelineError> {
    let mut acc = Accumulator::new(&config.regions, fuel_slots(&config.taxonomy, &config.interconnections));

    for record in records {
        let hour = parse_hour(&record.hour)?;
        let category = config.taxonomy.normalize(&record.raw_category)?;
        let region = area_code(&record.region);
        let interconnection = area_code(&record.interconnection);
        let slot = (category.to_string(), interconnection);

        acc.add(&region, hour, &slot, record.share).map_err(|rejected| match rejected {
            Rejected::Region => PipelineError::UnknownRegion { region },
            Rejected::Slot => PipelineError::UnknownInterconnection {
                interconnection: slot.1.clone(),
            },
        })?;
    }

    tracing::debug!(rows = acc.row_count(), records = records.len(), "fuel records accumulated");
    Ok(acc)
}

/// Accumulate emission records for the given (already discovered) metrics.
pub fn aggregate_emission(
    records: &[EmissionRecord],
    metrics: &[String],
    config: &PipelineConfig,
) -> Result<EmissionAccumulator, PipelineError> {
    let schema = &config.emission;
    let mut acc = Accumulator::new(&config.regions, metrics.to_vec());

    for (index, record) in records.iter().enumerate() {
        let raw_hour = record.get_str(&schema.hour_field).ok_or_else(|| {
            PipelineError::schema(format!("record {index} has no string field '{}'", schema.hour_field))
        })?;
        let hour = parse_hour(raw_hour)?;
        let region = emission_region(record, index, schema)?;

        for metric in metrics {
            let value = metric_value(record, index, metric, schema)?;
            acc.add(&region, hour, metric, value).map_err(|rejected| match rejected {
                Rejected::Region => PipelineError::UnknownRegion { region: region.clone() },
                Rejected::Slot => PipelineError::schema(format!("metric '{metric}' is not in the slot template")),
            })?;
        }
    }

    if let RegionAssignment::Fixed(region) = &schema.region_assignment {
        let mixed = mixed_area_hours(records, schema)?;
        if let Some(first) = mixed.first() {
            tracing::warn!(
                region = %region,
                hours = mixed.len(),
                first = %first,
                "fixed emission region summed intensities from several price areas"
            );
        }
    }

    tracing::debug!(rows = acc.row_count(), records = records.len(), "emission records accumulated");
    Ok(acc)
}

fn emission_region(record: &EmissionRecord, index: usize, schema: &EmissionSchema) -> Result<String, PipelineError> {
    match &schema.region_assignment {
        RegionAssignment::Fixed(region) => Ok(area_code(region)),
        RegionAssignment::FromRecord => record
            .get_str(&schema.region_field)
            .map(area_code)
            .ok_or_else(|| {
                PipelineError::schema(format!("record {index} has no string field '{}'", schema.region_field))
            }),
    }
}

/// Hours at which records from more than one source `PriceArea` are present.
///
/// Intensities are not additive; under a fixed region assignment these hours
/// hold the sum of several areas' values.
fn mixed_area_hours(records: &[EmissionRecord], schema: &EmissionSchema) -> Result<BTreeSet<NaiveDateTime>, PipelineError> {
    let mut first_area: BTreeMap<NaiveDateTime, String> = BTreeMap::new();
    let mut mixed = BTreeSet::new();
    for record in records {
        let (Some(raw_hour), Some(area)) = (record.get_str(&schema.hour_field), record.get_str(&schema.region_field))
        else {
            continue;
        };
        let hour = parse_hour(raw_hour)?;
        let area = area_code(area);
        let seen = first_area.entry(hour).or_insert_with(|| area.clone());
        if *seen != area {
            mixed.insert(hour);
        }
    }
    Ok(mixed)
}

fn metric_value(record: &EmissionRecord, index: usize, metric: &str, schema: &EmissionSchema) -> Result<f64, PipelineError> {
    let field = schema.field_for(metric);
    match record.get(&field) {
        None => Err(PipelineError::schema(format!("record {index} is missing metric field '{field}'"))),
        Some(v) => v
            .as_f64()
            .ok_or_else(|| PipelineError::schema(format!("record {index} field '{field}' is not numeric: {v}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn fuel(hour: &str, region: &str, link: &str, raw: &str, share: f64) -> FuelRecord {
        FuelRecord {
            hour: hour.to_string(),
            region: region.to_string(),
            interconnection: link.to_string(),
            raw_category: raw.to_string(),
            share,
        }
    }

    fn hour(raw: &str) -> NaiveDateTime {
        parse_hour(raw).unwrap()
    }

    fn slot(c: &str, i: &str) -> FuelSlot {
        (c.to_string(), i.to_string())
    }

    #[test]
    fn collapsing_labels_sum_into_one_slot() {
        let config = PipelineConfig::default();
        let records = vec![
            fuel("2019-01-01T00:00", "DK1", "NO", "Offshore", 0.3),
            fuel("2019-01-01T00:00", "DK1", "NO", "Onshore", 0.2),
        ];
        let acc = aggregate_fuel(&records, &config).unwrap();
        let h = hour("2019-01-01T00:00");

        assert!((acc.value("DK1", h, &slot("Vind", "NO")).unwrap() - 0.5).abs() < 1e-12);
        for s in acc.slots() {
            if *s != slot("Vind", "NO") {
                assert_eq!(acc.value("DK1", h, s), Some(0.0), "slot {s:?}");
            }
        }
        // DK2 exists but saw no hours.
        assert!(acc.hours("DK2").unwrap().is_empty());
    }

    #[test]
    fn exact_duplicates_are_summed() {
        let config = PipelineConfig::default();
        let records = vec![
            fuel("2019-01-01T05:00", "DK2", "SE", "Kul", 0.1),
            fuel("2019-01-01T05:00", "DK2", "SE", "Kul", 0.1),
        ];
        let acc = aggregate_fuel(&records, &config).unwrap();
        let v = acc.value("DK2", hour("2019-01-01T05:00"), &slot("Kul og Olie", "SE")).unwrap();
        assert!((v - 0.2).abs() < 1e-12);
    }

    #[test]
    fn region_codes_are_normalized() {
        let config = PipelineConfig::default();
        let records = vec![fuel("2019-01-01T00:00", " dk1", "no", "Sol", 1.0)];
        let acc = aggregate_fuel(&records, &config).unwrap();
        assert_eq!(acc.value("DK1", hour("2019-01-01T00:00"), &slot("Sol", "NO")), Some(1.0));
    }

    #[test]
    fn unknown_label_aborts() {
        let config = PipelineConfig::default();
        let records = vec![
            fuel("2019-01-01T00:00", "DK1", "NO", "Offshore", 0.3),
            fuel("2019-01-01T00:00", "DK1", "NO", "Tidevand", 0.2),
        ];
        let err = aggregate_fuel(&records, &config).unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnknownCategory {
                label: "Tidevand".to_string()
            }
        );
    }

    #[test]
    fn unknown_region_and_interconnection_abort() {
        let config = PipelineConfig::default();
        let err = aggregate_fuel(&[fuel("2019-01-01T00:00", "SE3", "NO", "Sol", 1.0)], &config).unwrap_err();
        assert_eq!(err, PipelineError::UnknownRegion { region: "SE3".to_string() });

        let err = aggregate_fuel(&[fuel("2019-01-01T00:00", "DK1", "PL", "Sol", 1.0)], &config).unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnknownInterconnection {
                interconnection: "PL".to_string()
            }
        );
    }

    fn emission(fields: serde_json::Value) -> EmissionRecord {
        serde_json::from_value(fields).unwrap()
    }

    #[test]
    fn emission_metrics_fill_and_pass_through() {
        let config = PipelineConfig::default();
        let metrics = vec!["CO2".to_string(), "SO2".to_string()];
        let records = vec![
            emission(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK1", "CO2PerkWh": 123, "SO2PerkWh": 4})),
            emission(json!({"HourUTC": "2019-01-01T01:00", "PriceArea": "DK2", "CO2PerkWh": 99.5, "SO2PerkWh": 0})),
        ];
        let acc = aggregate_emission(&records, &metrics, &config).unwrap();
        assert_eq!(acc.value("DK1", hour("2019-01-01T00:00"), &"CO2".to_string()), Some(123.0));
        assert_eq!(acc.value("DK2", hour("2019-01-01T01:00"), &"CO2".to_string()), Some(99.5));
        assert_eq!(acc.row_count(), 2);
    }

    #[test]
    fn fixed_region_assignment_ignores_record_region() {
        let mut config = PipelineConfig::default();
        config.emission.region_assignment = RegionAssignment::Fixed("DK1".to_string());
        let metrics = vec!["CO2".to_string()];
        let records = vec![emission(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK2", "CO2PerkWh": 7}))];
        let acc = aggregate_emission(&records, &metrics, &config).unwrap();
        assert_eq!(acc.value("DK1", hour("2019-01-01T00:00"), &"CO2".to_string()), Some(7.0));
        assert!(acc.hours("DK2").unwrap().is_empty());
    }

    #[test]
    fn fixed_region_flags_hours_merged_across_areas() {
        let mut config = PipelineConfig::default();
        config.emission.region_assignment = RegionAssignment::Fixed("DK1".to_string());
        let metrics = vec!["CO2".to_string()];
        let records = vec![
            emission(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK1", "CO2PerkWh": 150})),
            emission(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "dk2", "CO2PerkWh": 140})),
            emission(json!({"HourUTC": "2019-01-01T01:00", "PriceArea": "DK1", "CO2PerkWh": 120})),
            emission(json!({"HourUTC": "2019-01-01T01:00", "PriceArea": "DK1", "CO2PerkWh": 1})),
        ];

        let mixed = mixed_area_hours(&records, &config.emission).unwrap();
        assert_eq!(mixed.into_iter().collect::<Vec<_>>(), vec![hour("2019-01-01T00:00")]);

        // The run still completes; the merged hour carries the sum.
        let acc = aggregate_emission(&records, &metrics, &config).unwrap();
        assert_eq!(acc.value("DK1", hour("2019-01-01T00:00"), &"CO2".to_string()), Some(290.0));
    }

    #[test]
    fn missing_or_null_metric_is_schema_mismatch() {
        let config = PipelineConfig::default();
        let metrics = vec!["CO2".to_string(), "SO2".to_string()];
        let records = vec![
            emission(json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK1", "CO2PerkWh": 1, "SO2PerkWh": 1})),
            emission(json!({"HourUTC": "2019-01-01T01:00", "PriceArea": "DK1", "CO2PerkWh": 1})),
        ];
        let err = aggregate_emission(&records, &metrics, &config).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { ref detail } if detail.contains("SO2PerkWh")));

        let records = vec![emission(
            json!({"HourUTC": "2019-01-01T00:00", "PriceArea": "DK1", "CO2PerkWh": null, "SO2PerkWh": 1}),
        )];
        assert!(matches!(
            aggregate_emission(&records, &metrics, &config),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }

    fn arb_fuel_record() -> impl Strategy<Value = FuelRecord> {
        let labels: Vec<&'static str> = vec!["Offshore", "Onshore", "Sol", "Kul", "Naturgas", "Halm", "Atomkraft"];
        (
            0u32..48,
            prop::sample::select(vec!["DK1", "DK2"]),
            prop::sample::select(vec!["DK1", "DK2", "GE", "NO", "SE", "NL"]),
            prop::sample::select(labels),
            0.0f64..1.0,
        )
            .prop_map(|(h, region, link, label, share)| {
                fuel(
                    &format!("2019-01-{:02}T{:02}:00", 1 + h / 24, h % 24),
                    region,
                    link,
                    label,
                    share,
                )
            })
    }

    proptest! {
        #[test]
        fn every_seen_hour_has_every_slot(records in prop::collection::vec(arb_fuel_record(), 0..200)) {
            let config = PipelineConfig::default();
            let acc = aggregate_fuel(&records, &config).unwrap();
            let expected = acc.slots().len();
            prop_assert_eq!(expected, 8 * 6);
            for (_, hours) in acc.regions() {
                for row in hours.values() {
                    prop_assert_eq!(row.len(), expected);
                    for s in acc.slots() {
                        prop_assert!(row.contains_key(s));
                    }
                }
            }
        }

        #[test]
        fn accumulated_total_equals_input_total(records in prop::collection::vec(arb_fuel_record(), 0..200)) {
            let config = PipelineConfig::default();
            let acc = aggregate_fuel(&records, &config).unwrap();
            let input: f64 = records.iter().map(|r| r.share).sum();
            let output: f64 = acc
                .regions()
                .flat_map(|(_, hours)| hours.values())
                .flat_map(|row| row.values())
                .sum();
            prop_assert!((input - output).abs() < 1e-9);
        }
    }
}
