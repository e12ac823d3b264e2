// @zen-component: MCP-RmcpLister
//
//! `tools/list` over real MCP transports via rmcp.
//!
//! Stdio servers are spawned as child processes (killed when the scan future
//! is dropped, e.g. on timeout); HTTP servers use the Streamable HTTP client
//! transport. Each call performs the `initialize` handshake, lists all tools
//! (rmcp follows pagination), and shuts the session down again.

use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

use rmcp::ServiceExt;
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::transport::TokioChildProcess;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;

use super::ToolLister;
use crate::models::{
    HttpServerConfig, ScanError, ServerDescriptor, ServerTransport, StdioServerConfig, Tool,
};

#[derive(Debug, Clone, Default)]
pub struct RmcpToolLister;

impl RmcpToolLister {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolLister for RmcpToolLister {
    async fn list_tools(&self, descriptor: &ServerDescriptor) -> Result<Vec<Tool>, ScanError> {
        let service = match &descriptor.transport {
            ServerTransport::Stdio(config) => connect_stdio(&descriptor.name, config).await?,
            ServerTransport::Http(config) => connect_http(&descriptor.name, config).await?,
        };

        let listed = service.peer().list_all_tools().await;

        if let Err(e) = service.cancel().await {
            debug!(server = %descriptor.name, "MCP session shutdown failed: {e}");
        }

        let rmcp_tools =
            listed.map_err(|e| ScanError::protocol(format!("tools/list failed: {e}")))?;

        Ok(rmcp_tools
            .into_iter()
            .map(|t| Tool {
                name: t.name.to_string(),
                description: t.description.as_deref().unwrap_or("").to_string(),
                input_schema: serde_json::Value::Object(t.input_schema.as_ref().clone()),
                server_name: descriptor.name.clone(),
            })
            .collect())
    }
}

/// Spawn a stdio server and perform the MCP handshake.
async fn connect_stdio(
    name: &str,
    config: &StdioServerConfig,
) -> Result<RunningService<RoleClient, ()>, ScanError> {
    if config.command.is_empty() {
        return Err(ScanError::connection_refused(
            "Command is required for stdio transport",
        ));
    }

    let mut cmd = tokio::process::Command::new(&config.command);
    cmd.args(&config.args)
        .envs(&config.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let transport = TokioChildProcess::new(cmd).map_err(|e| {
        ScanError::connection_refused(format!(
            "Failed to spawn stdio process '{}': {e}",
            config.command
        ))
    })?;

    let service: RunningService<RoleClient, ()> = ().serve(transport).await.map_err(|e| {
        ScanError::protocol(format!("Failed to initialize stdio MCP server {name}: {e}"))
    })?;

    Ok(service)
}

/// Connect to a Streamable HTTP server and perform the MCP handshake.
async fn connect_http(
    name: &str,
    config: &HttpServerConfig,
) -> Result<RunningService<RoleClient, ()>, ScanError> {
    if config.url.is_empty() {
        return Err(ScanError::connection_refused(
            "URL is required for HTTP transport",
        ));
    }

    let mut header_map = reqwest::header::HeaderMap::new();
    for (key, value) in &config.headers {
        if let (Ok(name), Ok(val)) = (
            reqwest::header::HeaderName::from_bytes(key.as_bytes()),
            reqwest::header::HeaderValue::from_str(value),
        ) {
            header_map.insert(name, val);
        }
    }

    let client = reqwest::Client::builder()
        .default_headers(header_map)
        .build()
        .map_err(|e| ScanError::protocol(format!("Failed to create HTTP client: {e}")))?;

    let transport = StreamableHttpClientTransport::with_client(
        client,
        StreamableHttpClientTransportConfig::with_uri(config.url.as_str()),
    );

    let service: RunningService<RoleClient, ()> = ().serve(transport).await.map_err(|e| {
        let error = format!("{e}");
        if error.contains("refused") {
            ScanError::connection_refused(format!("Connection to {name} refused: {error}"))
        } else {
            ScanError::protocol(format!("Failed to connect to MCP server {name}: {error}"))
        }
    })?;

    Ok(service)
}
