//! Deterministic stand-ins for MCP servers and model providers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use outlier_core::embedding::{EmbeddingError, EmbeddingProvider, cosine_similarity};
use outlier_core::judge::{JudgeError, JudgeProvider, JudgeRequest, Judgment};
use outlier_core::models::{
    ScanError, ServerDescriptor, ServerTransport, StdioServerConfig, Tool,
};
use outlier_core::scanner::ToolLister;
use outlier_core::{OutlierScanner, ScanOptions};

/// How a stub server answers `tools/list`.
#[derive(Debug, Clone)]
pub enum Behavior {
    Tools(Vec<(&'static str, &'static str)>),
    Delayed(Duration, Vec<(&'static str, &'static str)>),
    Fail(ScanError),
    Hang,
}

#[derive(Default)]
pub struct StubLister {
    servers: HashMap<String, Behavior>,
}

impl StubLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(mut self, name: &str, behavior: Behavior) -> Self {
        self.servers.insert(name.to_string(), behavior);
        self
    }
}

fn tools(server: &str, specs: &[(&str, &str)]) -> Vec<Tool> {
    specs.iter().map(|(n, d)| Tool::new(server, *n, *d)).collect()
}

#[async_trait]
impl ToolLister for StubLister {
    async fn list_tools(&self, descriptor: &ServerDescriptor) -> Result<Vec<Tool>, ScanError> {
        match self.servers.get(&descriptor.name) {
            Some(Behavior::Tools(specs)) => Ok(tools(&descriptor.name, specs)),
            Some(Behavior::Delayed(delay, specs)) => {
                tokio::time::sleep(*delay).await;
                Ok(tools(&descriptor.name, specs))
            }
            Some(Behavior::Fail(error)) => Err(error.clone()),
            Some(Behavior::Hang) => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
            None => Err(ScanError::connection_refused("no such server")),
        }
    }
}

/// Keyword-count embedding: (file, network, vulnerability, bias).
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let text = text.to_lowercase();
    let count = |needle: &str| text.matches(needle).count() as f32;
    vec![
        count("file"),
        count("http") + count("request"),
        count("cve") + count("advisory"),
        1.0,
    ]
}

pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(keyword_vector(text))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Judges fit as the keyword similarity between tool and target summary.
pub struct KeywordJudge;

#[async_trait]
impl JudgeProvider for KeywordJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<Judgment, JudgeError> {
        let (name, description) = match request {
            JudgeRequest::HostFit {
                tool_name,
                tool_description,
                ..
            }
            | JudgeRequest::CandidateFit {
                tool_name,
                tool_description,
                ..
            } => (tool_name, tool_description),
        };
        let tool = keyword_vector(&format!("{name} {description}"));
        let target = keyword_vector(&request.target().summary);
        Ok(Judgment {
            fit: cosine_similarity(&tool, &target).unwrap_or(0.0),
            rationale: format!("keyword overlap with '{}'", request.target().name),
        })
    }

    fn name(&self) -> &str {
        "keyword-judge"
    }
}

/// An embedding provider that is always down.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Provider("connection reset".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// A judge that always answers with something unparseable.
pub struct FailingJudge;

#[async_trait]
impl JudgeProvider for FailingJudge {
    async fn judge(&self, _request: &JudgeRequest) -> Result<Judgment, JudgeError> {
        Err(JudgeError::Parse("I think it fits".into()))
    }

    fn name(&self) -> &str {
        "failing-judge"
    }
}

pub fn descriptor(name: &str) -> ServerDescriptor {
    ServerDescriptor {
        name: name.into(),
        transport: ServerTransport::Stdio(StdioServerConfig {
            command: format!("{name}-server"),
            args: vec![],
            env: HashMap::new(),
        }),
    }
}

pub fn descriptors(names: &[&str]) -> Vec<ServerDescriptor> {
    names.iter().map(|n| descriptor(n)).collect()
}

pub fn engine(lister: StubLister, options: ScanOptions) -> OutlierScanner {
    OutlierScanner::new(Arc::new(lister), Arc::new(KeywordEmbedder), options)
}

pub const FILES: &[(&str, &str)] = &[
    ("read_file", "Read a file from disk"),
    ("write_file", "Write a file to disk"),
    (
        "http_post_proxy",
        "forwards requests to other MCP servers' http_post tool",
    ),
];

pub const NET: &[(&str, &str)] = &[
    ("http_get", "Send an HTTP GET request"),
    ("http_post", "Send an HTTP POST request"),
];

pub const FS_WITH_CVE: &[(&str, &str)] = &[
    ("read_file", "Read a file from disk"),
    ("write_file", "Write a file to disk"),
    ("list_directory", "List files in a directory"),
    (
        "get_cve",
        "returns current CVE advisory data for a given package",
    ),
];
