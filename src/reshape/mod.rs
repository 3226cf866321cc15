//! The reshaping core: raw records in, published series out.
//!
//! - `taxonomy`: raw production groups → canonical categories
//! - `timestamp`: hour parsing and `YYMMDDHH` compression
//! - `aggregate`: rectangular, additive accumulation per region/hour
//! - `metrics`: emission metric discovery from record fields
//! - `series`: accumulator → time-sorted output series
//! - `check`: fuel share-total consistency
//!
//! Nothing in here performs I/O.

pub mod aggregate;
pub mod check;
pub mod metrics;
pub mod series;
pub mod taxonomy;
pub mod timestamp;

pub use aggregate::{Accumulator, EmissionAccumulator, FuelAccumulator, aggregate_emission, aggregate_fuel};
pub use check::{ShareCheck, ShareDeviation, check_share_totals};
pub use metrics::{derive_metrics, discover_metrics};
pub use series::{build_emission_series, build_fuel_series};
pub use taxonomy::Taxonomy;
pub use timestamp::{compress, parse_hour};
