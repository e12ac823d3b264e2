//! Human-readable scan report.

use std::fmt::Write;

use outlier_core::ScanReport;
use outlier_core::models::DeviationResult;
use outlier_core::report::server_status;

/// Tools listed per server before eliding the rest.
const TOOL_PREVIEW: usize = 5;
/// Description characters shown in the server listing.
const DESCRIPTION_PREVIEW: usize = 60;
/// Confidence above which a deviation is called out as high risk.
const HIGH_RISK: f64 = 0.8;

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// Render the text report. `all_results` also lists tools that passed.
pub fn text(report: &ScanReport, all_results: bool) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let summary = &report.summary;

    writeln!(out, "MCP Outlier Scan Report")?;
    writeln!(out, "=======================")?;
    writeln!(out, "Total servers: {}", summary.total_servers)?;
    writeln!(out, "Successfully scanned: {}", summary.successful_scans)?;
    writeln!(out, "Failed: {}", summary.failed_scans)?;
    writeln!(out, "Total tools: {}", summary.total_tools)?;
    if summary.cancelled {
        writeln!(out, "Scan was interrupted; results are partial")?;
    }

    writeln!(out)?;
    writeln!(out, "Server Details:")?;
    for server in &report.servers {
        writeln!(out, "\n[{}] {}", server_status(server), server.name)?;
        if let Some(error) = &server.scan_error {
            writeln!(out, "  Error ({}): {}", error.kind, error.message)?;
            continue;
        }
        writeln!(out, "  Tools: {}", server.tools.len())?;
        for tool in server.tools.iter().take(TOOL_PREVIEW) {
            writeln!(
                out,
                "    • {}: {}",
                tool.name,
                preview(&tool.description, DESCRIPTION_PREVIEW)
            )?;
        }
        if server.tools.len() > TOOL_PREVIEW {
            writeln!(out, "    ... and {} more", server.tools.len() - TOOL_PREVIEW)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Detected Deviations: {}", summary.deviations_found)?;
    if summary.deviations_found == 0 {
        writeln!(out, "No deviations detected")?;
    } else {
        writeln!(out, "The following tools may be malicious or unintended:")?;
    }

    for result in &report.results {
        if result.is_deviation {
            deviation(&mut out, result)?;
        } else if all_results {
            writeln!(
                out,
                "\n[OK] {} (from {})",
                result.tool.name, result.tool.server_name
            )?;
            writeln!(out, "  Confidence: {:.1}%", result.confidence * 100.0)?;
            reason(&mut out, result)?;
        }
    }

    Ok(out)
}

fn deviation(out: &mut String, result: &DeviationResult) -> std::fmt::Result {
    writeln!(
        out,
        "\n[DEVIATION] {} (from {})",
        result.tool.name, result.tool.server_name
    )?;
    writeln!(out, "  Confidence: {:.1}%", result.confidence * 100.0)?;
    if !result.tool.description.is_empty() {
        let mut lines = result.tool.description.lines();
        if let Some(first) = lines.next() {
            writeln!(out, "  Description: {first}")?;
        }
        for line in lines.by_ref().take(2) {
            writeln!(out, "               {line}")?;
        }
        let rest = lines.count();
        if rest > 0 {
            writeln!(out, "               ... ({rest} more lines)")?;
        }
    }
    reason(out, result)?;
    if result.confidence > HIGH_RISK {
        writeln!(out, "  HIGH RISK: Review this tool immediately")?;
    }
    writeln!(
        out,
        "  Recommendation: Investigate why this tool exists in the {} server",
        result.tool.server_name
    )
}

fn reason(out: &mut String, result: &DeviationResult) -> std::fmt::Result {
    writeln!(out, "  Reason:")?;
    for line in result.reason.lines() {
        writeln!(out, "    {line}")?;
    }
    Ok(())
}
