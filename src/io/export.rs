//! Write published series to disk.
//!
//! One JSON file per year and dataset (`2019_fuel_data.json`,
//! `2019_emission_data.json`), compact by default since the files are fetched by
//! a browser.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::DatasetKind;
use crate::error::{AppError, EXIT_CONFIG};

/// Accepts a finished structure and persists it.
pub trait SeriesSink {
    fn write<T: Serialize>(&self, year: i32, kind: DatasetKind, value: &T) -> Result<PathBuf, AppError>;
}

#[derive(Debug, Clone)]
pub struct JsonDirSink {
    dir: PathBuf,
    pretty: bool,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>, pretty: bool) -> Self {
        Self { dir: dir.into(), pretty }
    }

    pub fn path_for(&self, year: i32, kind: DatasetKind) -> PathBuf {
        self.dir.join(format!("{year}_{}.json", kind.file_stem()))
    }
}

impl SeriesSink for JsonDirSink {
    fn write<T: Serialize>(&self, year: i32, kind: DatasetKind, value: &T) -> Result<PathBuf, AppError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::new(
                EXIT_CONFIG,
                format!("Failed to create output directory '{}': {e}", self.dir.display()),
            )
        })?;

        let path = self.path_for(year, kind);
        let file = File::create(&path)
            .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to create '{}': {e}", path.display())))?;
        let mut writer = BufWriter::new(file);

        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, value)
        } else {
            serde_json::to_writer(&mut writer, value)
        };
        result.map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to write '{}': {e}", path.display())))?;
        writer
            .flush()
            .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to write '{}': {e}", path.display())))?;

        tracing::info!(path = %path.display(), dataset = kind.file_stem(), "series written");
        Ok(path)
    }
}

/// Read a previously written series file.
pub fn read_series<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Invalid series JSON '{}': {e}", path.display())))
}
