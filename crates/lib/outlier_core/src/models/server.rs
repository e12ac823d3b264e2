//! Server and tool models.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Connection descriptors
// =============================================================================

/// Stdio-based MCP server: spawned as a local subprocess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StdioServerConfig {
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// HTTP-based MCP server (Streamable HTTP transport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpServerConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

/// Transport configuration for one server entry.
///
/// Untagged so that the `mcpServers` entries of a desktop client config
/// deserialize directly: an entry with `url` is HTTP, one with `command` is
/// stdio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerTransport {
    Http(HttpServerConfig),
    Stdio(StdioServerConfig),
}

impl ServerTransport {
    /// Get the endpoint string (URL for HTTP, command line for stdio).
    pub fn endpoint(&self) -> String {
        match self {
            Self::Http(c) => c.url.clone(),
            Self::Stdio(c) if c.args.is_empty() => c.command.clone(),
            Self::Stdio(c) => format!("{} {}", c.command, c.args.join(" ")),
        }
    }
}

/// A configured server, as handed over by the config loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub name: String,
    pub transport: ServerTransport,
}

// =============================================================================
// Scan results
// =============================================================================

/// A named, described capability exposed by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// Passed through unexamined.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub input_schema: serde_json::Value,
    pub server_name: String,
}

impl Tool {
    pub fn new(
        server_name: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::Value::Null,
            server_name: server_name.into(),
        }
    }

    /// Standalone text used to embed this tool.
    pub fn embedding_text(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.description)
        }
    }

    /// One line of a server context document.
    pub fn context_line(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.name, self.description)
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

/// Why a server could not be scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanErrorKind {
    Timeout,
    ConnectionRefused,
    MalformedResponse,
    Protocol,
    Cancelled,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::ConnectionRefused => "connection-refused",
            Self::MalformedResponse => "malformed-response",
            Self::Protocol => "protocol",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Transport-level failure for a single server.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub message: String,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::Timeout, message)
    }

    pub fn connection_refused(message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::ConnectionRefused, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::MalformedResponse, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::Protocol, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ScanErrorKind::Cancelled, "scan cancelled")
    }
}

/// A server after its scan attempt.
///
/// Invariant: when `scan_error` is set, `tools` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    pub name: String,
    pub descriptor: ServerDescriptor,
    pub tools: Vec<Tool>,
    pub scan_error: Option<ScanError>,
}

impl Server {
    pub fn scanned(descriptor: ServerDescriptor, tools: Vec<Tool>) -> Self {
        Self {
            name: descriptor.name.clone(),
            descriptor,
            tools,
            scan_error: None,
        }
    }

    pub fn failed(descriptor: ServerDescriptor, error: ScanError) -> Self {
        Self {
            name: descriptor.name.clone(),
            descriptor,
            tools: Vec::new(),
            scan_error: Some(error),
        }
    }

    pub fn is_scanned(&self) -> bool {
        self.scan_error.is_none()
    }

    /// Whether this server can take part in context comparisons.
    pub fn has_context(&self) -> bool {
        self.is_scanned() && !self.tools.is_empty()
    }
}
