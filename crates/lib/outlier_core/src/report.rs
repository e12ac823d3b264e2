//! Machine-readable scan report.
//!
//! The JSON document lists every attempted server (with its error kind when
//! the scan failed) and only the tools that were flagged as deviations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{DetectionScore, ScanErrorKind, Server};
use crate::scan::ScanReport;

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub scan_timestamp: DateTime<Utc>,
    pub summary: JsonSummary,
    pub servers: Vec<JsonServer<'a>>,
    pub deviations: Vec<JsonDeviation<'a>>,
}

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub total_servers: usize,
    pub successful_scans: usize,
    pub failed_scans: usize,
    pub total_tools: usize,
    pub deviations_found: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct JsonServer<'a> {
    pub name: &'a str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ScanErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    pub tool_count: usize,
    pub tools: Vec<JsonToolRef<'a>>,
}

#[derive(Debug, Serialize)]
pub struct JsonToolRef<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct JsonTool<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub server: &'a str,
}

#[derive(Debug, Serialize)]
pub struct JsonDeviation<'a> {
    pub tool: JsonTool<'a>,
    pub is_deviation: bool,
    pub confidence: f64,
    pub reason: &'a str,
    pub scores: &'a [DetectionScore],
    pub advisories: &'a [String],
}

/// Scan status label of a server: `scanned` or `failed`.
pub fn server_status(server: &Server) -> &'static str {
    if server.is_scanned() { "scanned" } else { "failed" }
}

impl<'a> JsonReport<'a> {
    pub fn new(report: &'a ScanReport, scan_timestamp: DateTime<Utc>) -> Self {
        let summary = &report.summary;
        Self {
            scan_timestamp,
            summary: JsonSummary {
                total_servers: summary.total_servers,
                successful_scans: summary.successful_scans,
                failed_scans: summary.failed_scans,
                total_tools: summary.total_tools,
                deviations_found: summary.deviations_found,
                cancelled: summary.cancelled,
            },
            servers: report
                .servers
                .iter()
                .map(|s| JsonServer {
                    name: &s.name,
                    status: server_status(s),
                    error_kind: s.scan_error.as_ref().map(|e| e.kind),
                    error: s.scan_error.as_ref().map(|e| e.message.as_str()),
                    tool_count: s.tools.len(),
                    tools: s
                        .tools
                        .iter()
                        .map(|t| JsonToolRef {
                            name: &t.name,
                            description: &t.description,
                        })
                        .collect(),
                })
                .collect(),
            deviations: report
                .results
                .iter()
                .filter(|r| r.is_deviation)
                .map(|r| JsonDeviation {
                    tool: JsonTool {
                        name: &r.tool.name,
                        description: &r.tool.description,
                        server: &r.tool.server_name,
                    },
                    is_deviation: r.is_deviation,
                    confidence: r.confidence,
                    reason: &r.reason,
                    scores: &r.scores,
                    advisories: &r.advisories,
                })
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
