//! Reporting utilities: run summaries and share-check tables.

pub mod format;

pub use format::*;
