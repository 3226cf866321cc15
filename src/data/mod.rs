//! Record sources.
//!
//! - `eds`: the Energi Data Service HTTP API (blocking, one request per dataset/year)
//! - `file`: saved responses on disk

use serde::Deserialize;

use crate::domain::{EmissionRecord, FuelRecord};
use crate::error::{AppError, EXIT_SOURCE};

pub mod eds;
pub mod file;

pub use eds::EdsClient;
pub use file::JsonFileSource;

/// Supplies one calendar year of raw records per dataset.
///
/// An empty vector is a valid answer ("no data for this year").
pub trait RecordSource {
    fn fetch_fuel(&self, year: i32) -> Result<Vec<FuelRecord>, AppError>;
    fn fetch_emission(&self, year: i32) -> Result<Vec<EmissionRecord>, AppError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DatasetResponse<T> {
    Envelope {
        #[serde(default)]
        total: Option<usize>,
        records: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> DatasetResponse<T> {
    /// Records of a complete response.
    ///
    /// When the envelope announces a `total`, anything short of it is a paged or
    /// capped answer and must not pass for a whole year.
    fn into_records(self) -> Result<Vec<T>, AppError> {
        match self {
            DatasetResponse::Envelope {
                total: Some(total),
                records,
            } if records.len() != total => Err(AppError::new(
                EXIT_SOURCE,
                format!(
                    "Incomplete response: {} of {total} records received.",
                    records.len()
                ),
            )),
            DatasetResponse::Envelope { records, .. } => Ok(records),
            DatasetResponse::Bare(records) => Ok(records),
        }
    }
}
