//! Share-total consistency check for the fuel mix.
//!
//! The source publishes shares as a partition of an area's consumption, so the
//! slots of one `(region, hour)` row should add up to 1. A row that doesn't points
//! at incomplete input for that hour or at a taxonomy defect. This check reports;
//! it never aborts the run.

use chrono::NaiveDateTime;

use crate::reshape::aggregate::FuelAccumulator;

#[derive(Debug, Clone, PartialEq)]
pub struct ShareDeviation {
    pub region: String,
    pub hour: NaiveDateTime,
    pub total: f64,
}

impl ShareDeviation {
    pub fn delta(&self) -> f64 {
        self.total - 1.0
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShareCheck {
    pub rows_checked: usize,
    pub tolerance: f64,
    /// Ordered by region, then hour.
    pub deviations: Vec<ShareDeviation>,
}

impl ShareCheck {
    pub fn is_consistent(&self) -> bool {
        self.deviations.is_empty()
    }
}

/// Sum every row of `acc` and collect rows further than `tolerance` from 1.
pub fn check_share_totals(acc: &FuelAccumulator, tolerance: f64) -> ShareCheck {
    let mut check = ShareCheck {
        tolerance,
        ..ShareCheck::default()
    };

    for (region, hours) in acc.regions() {
        for (hour, row) in hours {
            check.rows_checked += 1;
            let total: f64 = row.values().sum();
            if (total - 1.0).abs() > tolerance {
                tracing::warn!(region, hour = %hour, total, "share total deviates from 1");
                check.deviations.push(ShareDeviation {
                    region: region.to_string(),
                    hour: *hour,
                    total,
                });
            }
        }
    }
    check
}
