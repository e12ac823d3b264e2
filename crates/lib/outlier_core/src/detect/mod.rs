//! Deviation detectors and the manager that runs them.
//!
//! A detector looks at one tool (addressed by [`ToolSlot`]) against the
//! read-only [`ScanSnapshot`] and returns zero or more scores. Which
//! detectors run is decided once, when the [`manager::DetectorManager`] is
//! built.

pub mod consistency;
pub mod cross_server;
pub mod manager;

use async_trait::async_trait;

use crate::context::{DEFAULT_SUMMARY_MAX_CHARS, ScanSnapshot, ToolSlot};
use crate::models::{DetectionScore, DetectorKind};

pub use consistency::ConsistencyDetector;
pub use cross_server::CrossServerDetector;
pub use manager::{DetectionOutcome, DetectorManager};

/// Default threshold above which a consistency score is flagged.
pub const DEFAULT_CONSISTENCY_THRESHOLD: f64 = 0.5;

/// Default gap between embedding and judged consistency scores that triggers
/// a disagreement advisory.
pub const DEFAULT_DISAGREEMENT_MARGIN: f64 = 0.4;

/// Default amount by which a foreign server must out-fit the host.
pub const DEFAULT_CROSS_SERVER_MARGIN: f64 = 0.3;

/// What one detector says about one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assessment {
    pub scores: Vec<DetectionScore>,
    pub advisories: Vec<String>,
}

#[async_trait]
pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    async fn assess(&self, slot: ToolSlot, snapshot: &ScanSnapshot) -> Assessment;
}

/// Thresholds and margins shared by the detectors.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub consistency_threshold: f64,
    pub disagreement_margin: f64,
    pub cross_server_margin: f64,
    pub summary_max_chars: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
            disagreement_margin: DEFAULT_DISAGREEMENT_MARGIN,
            cross_server_margin: DEFAULT_CROSS_SERVER_MARGIN,
            summary_max_chars: DEFAULT_SUMMARY_MAX_CHARS,
        }
    }
}
