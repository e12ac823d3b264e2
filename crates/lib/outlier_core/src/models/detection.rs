//! Detection scores, per-tool results and scan counters.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::server::{ScanErrorKind, Tool};

/// Which detector produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorKind {
    Consistency,
    CrossServer,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consistency => f.write_str("consistency"),
            Self::CrossServer => f.write_str("cross-server"),
        }
    }
}

/// How a score was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Embedding,
    Judged,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedding => f.write_str("Embedding"),
            Self::Judged => f.write_str("LLM"),
        }
    }
}

/// One deviation-strength measurement for a tool. Higher is more suspicious.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionScore {
    pub detector: DetectorKind,
    pub method: DetectionMethod,
    /// Always within `[0, 1]`.
    pub value: f64,
    /// Whether the value crossed the producing detector's decision rule.
    pub flagged: bool,
    pub detail: String,
}

impl DetectionScore {
    pub fn new(
        detector: DetectorKind,
        method: DetectionMethod,
        value: f64,
        flagged: bool,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            detector,
            method,
            value: clamp_unit(value),
            flagged,
            detail: detail.into(),
        }
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Final verdict for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationResult {
    pub tool: Tool,
    pub is_deviation: bool,
    /// Maximum of `scores[..].value`; 0.0 when there are no scores.
    pub confidence: f64,
    pub scores: Vec<DetectionScore>,
    /// Notes for a human reviewer (e.g. strong disagreement between methods).
    pub advisories: Vec<String>,
    pub reason: String,
}

impl DeviationResult {
    /// Merge detector output into a result.
    ///
    /// Confidence is the maximum score, never an average: a tool is caught if
    /// any single method catches it.
    pub fn from_scores(tool: Tool, scores: Vec<DetectionScore>, advisories: Vec<String>) -> Self {
        let confidence = scores.iter().map(|s| s.value).fold(0.0_f64, f64::max);
        let is_deviation = scores.iter().any(|s| s.flagged);
        let reason = compose_reason(&scores, &advisories);
        Self {
            tool,
            is_deviation,
            confidence,
            scores,
            advisories,
            reason,
        }
    }
}

fn compose_reason(scores: &[DetectionScore], advisories: &[String]) -> String {
    if scores.is_empty() {
        return "Consistent: no detection scores available for this tool".to_string();
    }

    let mut lines = Vec::with_capacity(scores.len() + advisories.len() + 1);
    let max = scores.iter().map(|s| s.value).fold(0.0_f64, f64::max);
    let summary = scores
        .iter()
        .map(|s| format!("{} {}: {:.2}", s.detector, s.method, s.value))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("Scores - {summary} (Max: {max:.2})"));

    for advisory in advisories {
        lines.push(format!("WARNING: {advisory}"));
    }
    for score in scores {
        let marker = if score.flagged { "!" } else { "-" };
        lines.push(format!(
            "  {marker} [{} {}] {}",
            score.detector, score.method, score.detail
        ));
    }
    lines.join("\n")
}

/// A server that could not be scanned, as listed in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFailure {
    pub server: String,
    pub kind: ScanErrorKind,
    pub message: String,
}

/// Scan-level counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_servers: usize,
    pub successful_scans: usize,
    pub failed_scans: usize,
    pub total_tools: usize,
    pub deviations_found: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ServerFailure>,
    /// Set when the scan was aborted before every tool was assessed.
    #[serde(default)]
    pub cancelled: bool,
}
