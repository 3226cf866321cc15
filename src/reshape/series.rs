//! Flatten accumulators into published, time-ordered series.

use std::collections::BTreeMap;

use crate::domain::{EmissionPoint, EmissionSeries, FuelSeries, SeriesTime, SharePoint, TimedPoint, TimestampMode};
use crate::reshape::aggregate::{Accumulator, EmissionAccumulator, FuelAccumulator};
use crate::reshape::timestamp::series_time;

/// One list per `(region, slot)`, every template slot present.
fn flatten<K, P>(
    acc: &Accumulator<K>,
    mode: TimestampMode,
    point: impl Fn(SeriesTime, f64) -> P,
) -> BTreeMap<String, BTreeMap<K, Vec<P>>>
where
    K: Ord + Clone,
    P: TimedPoint,
{
    let mut out = BTreeMap::new();
    for (region, hours) in acc.regions() {
        let mut lists: BTreeMap<K, Vec<P>> = acc
            .slots()
            .iter()
            .map(|slot| (slot.clone(), Vec::with_capacity(hours.len())))
            .collect();

        for (hour, row) in hours {
            let t = series_time(*hour, mode);
            for (slot, value) in row {
                if let Some(list) = lists.get_mut(slot) {
                    list.push(point(t.clone(), *value));
                }
            }
        }

        for list in lists.values_mut() {
            sort_by_time(list);
        }
        out.insert(region.to_string(), lists);
    }
    out
}

/// Stable sort on the time key only; equal keys keep encounter order.
pub fn sort_by_time<P: TimedPoint>(points: &mut [P]) {
    points.sort_by(|a, b| a.time().cmp(b.time()));
}

pub fn build_fuel_series(acc: &FuelAccumulator, mode: TimestampMode) -> FuelSeries {
    let flat = flatten(acc, mode, |t, s| SharePoint { t, s });

    let mut regions = BTreeMap::new();
    for (region, lists) in flat {
        let mut categories: BTreeMap<String, BTreeMap<String, Vec<SharePoint>>> = BTreeMap::new();
        for ((category, interconnection), points) in lists {
            categories.entry(category).or_default().insert(interconnection, points);
        }
        regions.insert(region, categories);
    }
    FuelSeries { regions }
}

pub fn build_emission_series(acc: &EmissionAccumulator, mode: TimestampMode) -> EmissionSeries {
    EmissionSeries {
        regions: flatten(acc, mode, |t, p| EmissionPoint { t, p }),
    }
}
