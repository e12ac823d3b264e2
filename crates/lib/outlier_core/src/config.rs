// @zen-component: CFG-ServerConfigLoader
//
//! Configuration loading and validation.
//!
//! Servers come from a desktop-client style JSON file:
//!
//! ```json
//! { "mcpServers": { "files": { "command": "npx", "args": ["server-files"] },
//!                   "net":   { "url": "http://localhost:8080/mcp" } } }
//! ```
//!
//! Key order in `mcpServers` is the configured server order.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::judge::JudgeError;
use crate::models::{ServerDescriptor, ServerTransport};

/// Configuration errors. All of them are fatal and raised before any server
/// is contacted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No MCP servers configured")]
    NoServers,

    #[error("No detection methods enabled")]
    NoDetectors,

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid server entry '{name}': {reason}")]
    InvalidServer { name: String, reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Embedding provider: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Judge provider: {0}")]
    Judge(#[from] JudgeError),
}

#[derive(Deserialize)]
struct DesktopConfig {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: serde_json::Map<String, serde_json::Value>,
}

/// Parse server descriptors from config file contents.
pub fn parse_servers(json: &str) -> Result<Vec<ServerDescriptor>, ConfigError> {
    let config: DesktopConfig = serde_json::from_str(json)?;
    if config.mcp_servers.is_empty() {
        return Err(ConfigError::NoServers);
    }

    config
        .mcp_servers
        .into_iter()
        .map(|(name, value)| {
            let transport: ServerTransport =
                serde_json::from_value(value).map_err(|_| ConfigError::InvalidServer {
                    name: name.clone(),
                    reason: "expected an object with \"command\" (stdio) or \"url\" (http)"
                        .to_string(),
                })?;
            validate_transport(&name, &transport)?;
            Ok(ServerDescriptor { name, transport })
        })
        .collect()
}

/// Read and parse a config file.
pub fn load_servers(path: &Path) -> Result<Vec<ServerDescriptor>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_servers(&contents)
}

fn validate_transport(name: &str, transport: &ServerTransport) -> Result<(), ConfigError> {
    let missing = match transport {
        ServerTransport::Stdio(c) if c.command.trim().is_empty() => Some("command is empty"),
        ServerTransport::Http(c) if c.url.trim().is_empty() => Some("url is empty"),
        _ => None,
    };
    match missing {
        Some(reason) => Err(ConfigError::InvalidServer {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Check that a threshold or margin lies within `[0, 1]`.
pub fn validate_unit(label: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{label} must be between 0 and 1, got {value}"
        )))
    }
}
