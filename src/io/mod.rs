//! Output helpers.
//!
//! - `SeriesSink` and the per-year JSON file sink (`export`)

pub mod export;

pub use export::*;
