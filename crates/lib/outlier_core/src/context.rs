// @zen-component: DET-ContextBuilder
//
//! Server contexts, the per-scan semantic fingerprint of every server.
//!
//! Built once per scan from the scanner output and then shared read-only
//! (`Arc<ScanSnapshot>`) by every detector. For each server with at least one
//! tool the snapshot holds:
//!
//! - the server context: embedding of the context document plus a bounded
//!   summary of it,
//! - per tool, the standalone tool embedding,
//! - per tool, the leave-one-out baseline (the same context built from the
//!   host's *other* tools), absent when the tool is the host's only tool.
//!
//! Servers that failed or reported zero tools are kept as entries (so indices
//! line up with the configured order) but have no context.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::embedding::{self, EmbeddingProvider};
use crate::gate::ProviderGate;
use crate::judge::ServerSummary;
use crate::models::{Server, Tool};

/// Default upper bound on summary length, in characters.
pub const DEFAULT_SUMMARY_MAX_CHARS: usize = 1500;

/// Aggregate fingerprint of one server's tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerContext {
    /// `None` when the embedding provider failed for this server.
    pub embedding: Option<Vec<f32>>,
    pub summary: String,
}

/// Leave-one-out context of a tool's own host.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolBaseline {
    pub embedding: Option<Vec<f32>>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolEntry {
    pub tool: Tool,
    pub embedding: Option<Vec<f32>>,
    pub baseline: Option<ToolBaseline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerEntry {
    pub name: String,
    pub context: Option<ServerContext>,
    pub tools: Vec<ToolEntry>,
}

impl ServerEntry {
    /// Name and full-context summary, as shown to a judge.
    pub fn summary(&self) -> Option<ServerSummary> {
        self.context.as_ref().map(|c| ServerSummary {
            name: self.name.clone(),
            summary: c.summary.clone(),
        })
    }
}

/// Position of a tool inside a snapshot: server index, then tool index.
///
/// Orders by configured server order, then reported tool order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolSlot {
    pub server: usize,
    pub tool: usize,
}

/// Immutable per-scan view of all servers, tools and their contexts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSnapshot {
    servers: Vec<ServerEntry>,
}

impl ScanSnapshot {
    pub fn new(servers: Vec<ServerEntry>) -> Self {
        Self { servers }
    }

    pub fn servers(&self) -> &[ServerEntry] {
        &self.servers
    }

    pub fn server(&self, index: usize) -> Option<&ServerEntry> {
        self.servers.get(index)
    }

    pub fn tool(&self, slot: ToolSlot) -> Option<&ToolEntry> {
        self.servers.get(slot.server)?.tools.get(slot.tool)
    }

    /// Every tool slot, in server order then tool order.
    pub fn slots(&self) -> Vec<ToolSlot> {
        self.servers
            .iter()
            .enumerate()
            .flat_map(|(server, entry)| {
                (0..entry.tools.len()).map(move |tool| ToolSlot { server, tool })
            })
            .collect()
    }

    /// Servers other than `index` that have a context, in configured order.
    pub fn candidates(&self, index: usize) -> impl Iterator<Item = (&ServerEntry, &ServerContext)> {
        self.servers
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != index)
            .filter_map(|(_, entry)| entry.context.as_ref().map(|c| (entry, c)))
    }

    pub fn tool_count(&self) -> usize {
        self.servers.iter().map(|s| s.tools.len()).sum()
    }
}

/// The context document: one `"name: description"` line per tool.
pub fn context_document<'a>(tools: impl IntoIterator<Item = &'a Tool>) -> String {
    tools
        .into_iter()
        .map(Tool::context_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bound `text` to `max_chars` characters, marking a cut with `…`.
pub fn truncate_summary(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}…", &text[..cut]),
    }
}

/// Where one embedding result goes.
#[derive(Debug, Clone, Copy)]
enum Target {
    Server(usize),
    Baseline(ToolSlot),
    Tool(ToolSlot),
}

/// Derives a [`ScanSnapshot`] from scanned servers.
pub struct ContextBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    gate: ProviderGate,
    summary_max_chars: usize,
}

impl ContextBuilder {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        gate: ProviderGate,
        summary_max_chars: usize,
    ) -> Self {
        Self {
            embedder,
            gate,
            summary_max_chars,
        }
    }

    /// Build the snapshot. Embedding failures leave `None` holes; they never
    /// fail the build.
    pub async fn build(&self, servers: &[Server]) -> ScanSnapshot {
        let mut entries = Vec::with_capacity(servers.len());
        let mut jobs: Vec<(Target, String)> = Vec::new();

        for (server_index, server) in servers.iter().enumerate() {
            if !server.has_context() {
                entries.push(ServerEntry {
                    name: server.name.clone(),
                    context: None,
                    tools: Vec::new(),
                });
                continue;
            }

            let document = context_document(&server.tools);
            jobs.push((Target::Server(server_index), document.clone()));

            let mut tools = Vec::with_capacity(server.tools.len());
            for (tool_index, tool) in server.tools.iter().enumerate() {
                let slot = ToolSlot {
                    server: server_index,
                    tool: tool_index,
                };
                jobs.push((Target::Tool(slot), tool.embedding_text()));

                let baseline = if server.tools.len() > 1 {
                    let others = context_document(
                        server
                            .tools
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| *i != tool_index)
                            .map(|(_, t)| t),
                    );
                    let summary = truncate_summary(&others, self.summary_max_chars);
                    jobs.push((Target::Baseline(slot), others));
                    Some(ToolBaseline {
                        embedding: None,
                        summary,
                    })
                } else {
                    None
                };

                tools.push(ToolEntry {
                    tool: tool.clone(),
                    embedding: None,
                    baseline,
                });
            }

            entries.push(ServerEntry {
                name: server.name.clone(),
                context: Some(ServerContext {
                    embedding: None,
                    summary: truncate_summary(&document, self.summary_max_chars),
                }),
                tools,
            });
        }

        info!(
            servers = entries.iter().filter(|e| e.context.is_some()).count(),
            embeddings = jobs.len(),
            provider = self.embedder.name(),
            "Building server contexts"
        );

        let embedder = &self.embedder;
        let gate = &self.gate;
        let vectors: Vec<(Target, Option<Vec<f32>>)> = stream::iter(jobs)
            .map(|(target, text)| async move {
                let label = format!("embed:{}", label_for(&target));
                let text = embedding::preprocess(&text);
                let vector = gate.run(&label, embedder.embed(&text)).await;
                (target, vector)
            })
            .buffered(gate.concurrency())
            .collect()
            .await;

        let mut missing = 0usize;
        for (target, vector) in vectors {
            if vector.is_none() {
                missing += 1;
            }
            match target {
                Target::Server(i) => {
                    if let Some(context) = entries[i].context.as_mut() {
                        context.embedding = vector;
                    }
                }
                Target::Tool(slot) => {
                    entries[slot.server].tools[slot.tool].embedding = vector;
                }
                Target::Baseline(slot) => {
                    let entry = &mut entries[slot.server].tools[slot.tool];
                    if let Some(baseline) = entry.baseline.as_mut() {
                        baseline.embedding = vector;
                    }
                }
            }
        }
        if missing > 0 {
            debug!(missing, "Some embeddings unavailable");
        }

        ScanSnapshot::new(entries)
    }
}

fn label_for(target: &Target) -> String {
    match target {
        Target::Server(i) => format!("server#{i}"),
        Target::Tool(slot) => format!("tool#{}.{}", slot.server, slot.tool),
        Target::Baseline(slot) => format!("baseline#{}.{}", slot.server, slot.tool),
    }
}
