//! Domain models for a scan.
//!
//! Everything here is created once and then only read: servers and tools come
//! out of the scanner, scores and results out of the detectors.

pub mod detection;
pub mod server;

pub use detection::{
    DetectionMethod, DetectionScore, DetectorKind, DeviationResult, ScanSummary, ServerFailure,
};
pub use server::{
    HttpServerConfig, ScanError, ScanErrorKind, Server, ServerDescriptor, ServerTransport,
    StdioServerConfig, Tool,
};
