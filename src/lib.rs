//! `declaration-series` library crate.
//!
//! The binary (`decl`) is a thin wrapper around this library so that:
//!
//! - the reshaping core is testable without network access or processes
//! - record sources and sinks stay swappable behind small traits
//! - schema drift is handled in configuration, not code

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
pub mod reshape;
