//! # outlier_core
//!
//! Hybrid detection engine for MCP tool deviations: scans configured MCP
//! servers, builds per-server semantic contexts and flags tools that do not
//! fit their host or fit another server better.

pub mod config;
pub mod context;
pub mod detect;
pub mod embedding;
pub mod gate;
pub mod judge;
pub mod models;
pub mod report;
pub mod scan;
pub mod scanner;

pub use scan::{OutlierScanner, ScanOptions, ScanReport};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
