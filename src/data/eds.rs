//! Energi Data Service integration for the hourly declaration datasets.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::data::{DatasetResponse, RecordSource};
use crate::domain::{DatasetKind, EmissionRecord, FuelRecord};
use crate::error::{AppError, EXIT_CONFIG, EXIT_SOURCE};

pub const DEFAULT_BASE_URL: &str = "https://api.energidataservice.dk";

/// Environment override for the API root (also read from `.env`).
pub const BASE_URL_ENV: &str = "EDS_BASE_URL";

pub struct EdsClient {
    client: Client,
    base_url: String,
}

impl EdsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn dataset_url(&self, kind: DatasetKind) -> String {
        format!("{}/dataset/{}", self.base_url, kind.source_dataset())
    }

    /// One request for a whole calendar year (Danish local time bounds, sorted by
    /// `HourUTC`). `limit=0` asks for every record; a response that still comes back
    /// short of its `total` is rejected.
    fn fetch_year<T: DeserializeOwned>(&self, kind: DatasetKind, year: i32) -> Result<Vec<T>, AppError> {
        let url = self.dataset_url(kind);
        let (start, end) = year_bounds(year)?;
        tracing::info!(dataset = kind.source_dataset(), year, "requesting records");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("offset", "0"),
                ("limit", "0"),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("sort", "HourUTC ASC"),
                ("timezone", "dk"),
            ])
            .send()
            .map_err(|e| AppError::new(EXIT_SOURCE, format!("Request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                EXIT_SOURCE,
                format!("Request to {url} failed with status {}.", resp.status()),
            ));
        }

        let body: DatasetResponse<T> = resp.json().map_err(|e| {
            AppError::new(
                EXIT_SOURCE,
                format!("Failed to parse {} response: {e}", kind.source_dataset()),
            )
        })?;

        let records = body
            .into_records()
            .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", kind.source_dataset())))?;
        tracing::info!(dataset = kind.source_dataset(), year, records = records.len(), "records received");
        Ok(records)
    }
}

impl RecordSource for EdsClient {
    fn fetch_fuel(&self, year: i32) -> Result<Vec<FuelRecord>, AppError> {
        self.fetch_year(DatasetKind::Fuel, year)
    }

    fn fetch_emission(&self, year: i32) -> Result<Vec<EmissionRecord>, AppError> {
        self.fetch_year(DatasetKind::Emission, year)
    }
}

/// `start`/`end` query values covering `year`.
fn year_bounds(year: i32) -> Result<(String, String), AppError> {
    let next = year
        .checked_add(1)
        .ok_or_else(|| AppError::new(EXIT_CONFIG, format!("Year {year} is out of range.")))?;
    Ok((format!("{year}-01-01T00:00"), format!("{next}-01-01T00:00")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const ONE_FUEL_ROW: &str = r#"{"HourUTC": "2019-01-01T00:00:00", "PriceArea": "DK1", "ConnectedArea": "NO", "ProductionGroup": "Offshore", "Share": 1.0}"#;

    #[test]
    fn year_bounds_cover_the_calendar_year() {
        let (start, end) = year_bounds(2019).unwrap();
        assert_eq!(start, "2019-01-01T00:00");
        assert_eq!(end, "2020-01-01T00:00");
    }

    #[test]
    fn last_representable_year_is_a_config_error() {
        let err = year_bounds(i32::MAX).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_CONFIG);

        // Rejected before any request goes out.
        let err = EdsClient::new("http://127.0.0.1:9").fetch_fuel(i32::MAX).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_CONFIG);
    }

    #[test]
    fn requests_every_record_of_the_year() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/dataset/DeclarationCoverageHour")
                .query_param("offset", "0")
                .query_param("limit", "0")
                .query_param("start", "2019-01-01T00:00")
                .query_param("end", "2020-01-01T00:00")
                .query_param("sort", "HourUTC ASC")
                .query_param("timezone", "dk");
            then.status(200)
                .header("content-type", "application/json")
                .body(format!(r#"{{"total": 1, "records": [{ONE_FUEL_ROW}]}}"#));
        });

        let records = EdsClient::new(server.base_url()).fetch_fuel(2019).unwrap();
        mock.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_category, "Offshore");
    }

    #[test]
    fn truncated_response_is_a_source_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/dataset/DeclarationCoverageHour");
            then.status(200)
                .header("content-type", "application/json")
                .body(format!(r#"{{"total": 876000, "limit": 100, "records": [{ONE_FUEL_ROW}]}}"#));
        });

        let err = EdsClient::new(server.base_url()).fetch_fuel(2019).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_SOURCE);
        assert!(err.to_string().contains("1 of 876000"), "{err}");
    }

    #[test]
    fn http_failure_is_a_source_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/dataset/DeclarationEmissionHour");
            then.status(503);
        });

        let err = EdsClient::new(server.base_url()).fetch_emission(2019).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_SOURCE);
    }

    #[test]
    fn dataset_urls() {
        let client = EdsClient::new("https://example.test/");
        assert_eq!(
            client.dataset_url(DatasetKind::Fuel),
            "https://example.test/dataset/DeclarationCoverageHour"
        );
        assert_eq!(
            client.dataset_url(DatasetKind::Emission),
            "https://example.test/dataset/DeclarationEmissionHour"
        );
    }
}
