// @zen-component: MCP-ServerScanner
//
//! Server scanner: queries every configured server for its tool list.
//!
//! One tokio task per server, each under its own timeout. A slow or broken
//! server only ever affects its own `Server` record: results are sent back
//! over a channel to a single collector and placed by descriptor index, so the
//! returned list always has one entry per descriptor, in configured order.
//! There is exactly one attempt per server per scan.

pub mod transport;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::{ScanError, Server, ServerDescriptor, Tool};

/// Default per-server scan timeout (30 seconds).
pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the tool list of one server.
#[async_trait]
pub trait ToolLister: Send + Sync {
    async fn list_tools(&self, descriptor: &ServerDescriptor) -> Result<Vec<Tool>, ScanError>;
}

pub struct ServerScanner {
    lister: Arc<dyn ToolLister>,
    timeout: Duration,
}

impl ServerScanner {
    pub fn new(lister: Arc<dyn ToolLister>, timeout: Duration) -> Self {
        Self { lister, timeout }
    }

    /// Scan all servers concurrently.
    ///
    /// Returns once every server has either answered, failed, timed out, or
    /// been cancelled through `cancel`.
    pub async fn scan_all(
        &self,
        descriptors: &[ServerDescriptor],
        cancel: &CancellationToken,
    ) -> Vec<Server> {
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Server)>();
        let mut tasks = JoinSet::new();

        for (index, descriptor) in descriptors.iter().cloned().enumerate() {
            let lister = self.lister.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();
            let timeout = self.timeout;

            tasks.spawn(async move {
                let server = match scan_one(lister.as_ref(), &descriptor, timeout, &cancel).await {
                    Ok(tools) => {
                        info!(server = %descriptor.name, tools = tools.len(), "Server scanned");
                        Server::scanned(descriptor, tools)
                    }
                    Err(e) => {
                        warn!(
                            server = %descriptor.name,
                            kind = %e.kind,
                            "Server scan failed: {}",
                            e.message
                        );
                        Server::failed(descriptor, e)
                    }
                };
                // The collector only goes away once every sender is dropped.
                let _ = tx.send((index, server));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<Server>> = vec![None; descriptors.len()];
        while let Some((index, server)) = rx.recv().await {
            slots[index] = Some(server);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Server scan task failed: {e}");
            }
        }

        slots
            .into_iter()
            .zip(descriptors)
            .map(|(slot, descriptor)| {
                slot.unwrap_or_else(|| {
                    Server::failed(
                        descriptor.clone(),
                        ScanError::protocol("scan task ended without a result"),
                    )
                })
            })
            .collect()
    }
}

async fn scan_one(
    lister: &dyn ToolLister,
    descriptor: &ServerDescriptor,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<Tool>, ScanError> {
    let tools = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ScanError::cancelled()),
        outcome = tokio::time::timeout(timeout, lister.list_tools(descriptor)) => match outcome {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScanError::timeout(format!(
                    "Server scan timed out after {}s",
                    timeout.as_secs_f64()
                )));
            }
        },
    };

    validate_tools(&descriptor.name, tools)
}

/// Check a reported tool list and stamp the hosting server name on it.
///
/// An empty list is accepted. Empty or duplicate tool names make the whole
/// response malformed.
pub fn validate_tools(server_name: &str, tools: Vec<Tool>) -> Result<Vec<Tool>, ScanError> {
    let mut seen = HashSet::with_capacity(tools.len());
    let mut validated = Vec::with_capacity(tools.len());

    for mut tool in tools {
        if tool.name.trim().is_empty() {
            return Err(ScanError::malformed("tool with empty name in tools/list"));
        }
        if !seen.insert(tool.name.clone()) {
            return Err(ScanError::malformed(format!(
                "duplicate tool name '{}' in tools/list",
                tool.name
            )));
        }
        tool.server_name = server_name.to_string();
        validated.push(tool);
    }

    Ok(validated)
}
