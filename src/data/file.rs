//! Saved dataset responses on disk.
//!
//! Lets a run be reproduced offline from a previously downloaded response. The file
//! may hold the API's `{"records": [...]}` envelope or a bare array of records.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use serde::de::DeserializeOwned;

use crate::data::{DatasetResponse, RecordSource};
use crate::domain::{EmissionRecord, FuelRecord};
use crate::error::{AppError, EXIT_CONFIG, EXIT_SOURCE};

pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read<T: DeserializeOwned>(&self) -> Result<Vec<T>, AppError> {
        let file = File::open(&self.path).map_err(|e| {
            AppError::new(
                EXIT_CONFIG,
                format!("Failed to open input '{}': {e}", self.path.display()),
            )
        })?;
        let body: DatasetResponse<T> = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            AppError::new(
                EXIT_SOURCE,
                format!("Invalid records in '{}': {e}", self.path.display()),
            )
        })?;
        let records = body.into_records().map_err(|e| {
            AppError::new(e.exit_code(), format!("{e} (file '{}')", self.path.display()))
        })?;
        tracing::info!(path = %self.path.display(), records = records.len(), "records read from file");
        Ok(records)
    }
}

impl RecordSource for JsonFileSource {
    // The file is assumed to hold exactly the requested year.
    fn fetch_fuel(&self, _year: i32) -> Result<Vec<FuelRecord>, AppError> {
        self.read()
    }

    fn fetch_emission(&self, _year: i32) -> Result<Vec<EmissionRecord>, AppError> {
        self.read()
    }
}
