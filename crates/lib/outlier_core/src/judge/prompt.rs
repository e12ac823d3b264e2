//! Prompt rendering and response parsing shared by the HTTP judges.

use serde::Deserialize;

use super::{JudgeError, JudgeRequest, Judgment};
use crate::models::detection::clamp_unit;

pub const SYSTEM_PROMPT: &str = "You are a security analyzer that checks whether tools exposed by \
MCP servers semantically belong to the server hosting them. Respond only with valid JSON.";

const RESPONSE_FORMAT: &str = r#"## Response Format
Respond with JSON only:
{
  "fit": float (0.0-1.0),  // 1.0 = clearly belongs, 0.0 = clearly does not
  "rationale": "one or two sentences"
}"#;

/// Render a request into the user message sent to the model.
pub fn render(request: &JudgeRequest) -> String {
    match request {
        JudgeRequest::HostFit {
            tool_name,
            tool_description,
            host,
        } => format!(
            "Analyze whether a tool semantically fits the server that hosts it.\n\n\
             ## Server\n**Name**: {}\n**Other tools in this server**:\n{}\n\n\
             ## Tool to Analyze\n**Name**: {tool_name}\n**Description**: {}\n\n\
             ## Task\nScore how well this tool fits the server's apparent purpose and the \
             pattern of its other tools. Watch for descriptions that hide the tool's real \
             purpose or that target other servers.\n\n{RESPONSE_FORMAT}",
            host.name,
            host.summary,
            describe(tool_description),
        ),
        JudgeRequest::CandidateFit {
            tool_name,
            tool_description,
            candidate,
            host,
        } => format!(
            "Analyze whether a tool belongs to a different server than the one hosting it.\n\n\
             ## Tool to Analyze\n**Name**: {tool_name}\n**Description**: {}\n\
             **Current server**: {}\n\n\
             ## Current Server Tools\n{}\n\n\
             ## Candidate Server: {}\n{}\n\n\
             ## Task\nScore how well this tool fits the candidate server '{}'. A high score \
             means it belongs to the candidate better than to its current server. Focus on \
             semantic meaning, not superficial name similarity.\n\n{RESPONSE_FORMAT}",
            describe(tool_description),
            host.name,
            host.summary,
            candidate.name,
            candidate.summary,
            candidate.name,
        ),
    }
}

fn describe(description: &str) -> &str {
    if description.trim().is_empty() {
        "(no description)"
    } else {
        description
    }
}

#[derive(Deserialize)]
struct RawJudgment {
    #[serde(alias = "score", alias = "fit_score")]
    fit: f64,
    #[serde(default, alias = "reasoning")]
    rationale: String,
}

/// Parse a model answer into a [`Judgment`].
///
/// Tolerates a Markdown code fence around the JSON object.
pub fn parse_judgment(content: &str) -> Result<Judgment, JudgeError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let raw: RawJudgment =
        serde_json::from_str(body).map_err(|e| JudgeError::Parse(format!("{e}: {body}")))?;

    if !raw.fit.is_finite() {
        return Err(JudgeError::Parse(format!("non-finite fit score: {}", raw.fit)));
    }

    Ok(Judgment {
        fit: clamp_unit(raw.fit),
        rationale: raw.rationale.trim().to_string(),
    })
}
