//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - dataset and run-mode enums (`DatasetKind`, `TimestampMode`, `RegionAssignment`)
//! - raw source records (`FuelRecord`, `EmissionRecord`)
//! - published outputs (`FuelSeries`, `EmissionSeries`, `RunOutcome`)

pub mod types;

pub use types::*;
