use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use outlier_core::ScanOptions;
use outlier_core::context::DEFAULT_SUMMARY_MAX_CHARS;
use outlier_core::detect::{
    DEFAULT_CONSISTENCY_THRESHOLD, DEFAULT_CROSS_SERVER_MARGIN, DEFAULT_DISAGREEMENT_MARGIN,
    DetectionConfig,
};
use outlier_core::embedding::config::{self as embedding_config, EmbeddingConfig};
use outlier_core::gate::DEFAULT_PROVIDER_CONCURRENCY;
use outlier_core::judge::config::{self as judge_config, JudgeConfig};
use outlier_core::models::DetectorKind;

const AFTER_HELP: &str = "\
Examples:
  mcp-outlier --config claude_desktop_config.json
  mcp-outlier --config mcp.json --use-ai
  mcp-outlier --config mcp.json --methods consistency
  mcp-outlier --config mcp.json --output json --save report.json

Environment:
  OPENAI_API_KEY          API key for OpenAI embeddings and judging
  EMBEDDING_PROVIDER      openai | ollama | local
  EMBEDDING_ACTIVE_MODEL  embedding model name
  OLLAMA_BASE_URL         Ollama API base URL
  JUDGE_PROVIDER          openai | ollama
  JUDGE_MODEL             chat model used for judging
  RUST_LOG                log filter (default: info)";

#[derive(Parser, Debug)]
#[command(
    name = "mcp-outlier",
    version,
    about = "Detect tools that do not belong to their MCP server",
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// MCP config file with an `mcpServers` map (Claude Desktop format).
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: PathBuf,

    /// Per-server scan timeout.
    #[arg(long, value_name = "SEC", default_value_t = 30)]
    pub timeout: u64,

    /// Detection methods (default: consistency cross-server).
    #[arg(long, value_enum, num_args = 1.., value_name = "METHOD")]
    pub methods: Vec<Method>,

    /// Add LLM judgment to every detector.
    #[arg(long)]
    pub use_ai: bool,

    /// OpenAI API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Embedding provider: openai, ollama or local.
    #[arg(long, value_name = "PROVIDER")]
    pub embedding_provider: Option<String>,

    /// Embedding model.
    #[arg(long, value_name = "MODEL")]
    pub embedding_model: Option<String>,

    /// Judge provider: openai or ollama.
    #[arg(long, value_name = "PROVIDER")]
    pub judge_provider: Option<String>,

    /// Judge chat model.
    #[arg(long, value_name = "MODEL")]
    pub judge_model: Option<String>,

    /// Ollama API base URL.
    #[arg(long, value_name = "URL")]
    pub ollama_url: Option<String>,

    /// Consistency scores above this are flagged.
    #[arg(long, value_name = "0..1", default_value_t = DEFAULT_CONSISTENCY_THRESHOLD)]
    pub consistency_threshold: f64,

    /// Embedding/LLM gap that adds a disagreement warning.
    #[arg(long, value_name = "0..1", default_value_t = DEFAULT_DISAGREEMENT_MARGIN)]
    pub disagreement_margin: f64,

    /// How much better a foreign server must fit to flag a tool.
    #[arg(long, value_name = "0..1", default_value_t = DEFAULT_CROSS_SERVER_MARGIN)]
    pub cross_server_margin: f64,

    /// Maximum length of a server summary shown to the judge.
    #[arg(long, value_name = "CHARS", default_value_t = DEFAULT_SUMMARY_MAX_CHARS)]
    pub summary_max_chars: usize,

    /// Maximum concurrent embedding/judge calls.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PROVIDER_CONCURRENCY)]
    pub provider_concurrency: usize,

    /// Timeout for a single embedding/judge call.
    #[arg(long, value_name = "SEC", default_value_t = 30)]
    pub provider_timeout: u64,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Also write the report to this file.
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Verbose logging; the text report lists every tool.
    #[arg(long)]
    pub debug: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Tool vs. its own server.
    Consistency,
    /// Tool vs. every other server.
    CrossServer,
    /// All methods.
    Multi,
    /// All methods with LLM judgment.
    Ai,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    pub fn detectors(&self) -> Vec<DetectorKind> {
        let all = [DetectorKind::Consistency, DetectorKind::CrossServer];
        if self.methods.is_empty() {
            return all.to_vec();
        }
        let mut kinds = Vec::new();
        for method in &self.methods {
            let wanted: &[DetectorKind] = match method {
                Method::Consistency => &[DetectorKind::Consistency],
                Method::CrossServer => &[DetectorKind::CrossServer],
                Method::Multi | Method::Ai => &all,
            };
            for kind in wanted {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
        }
        kinds
    }

    /// Whether the judged method is on.
    pub fn judged(&self) -> bool {
        self.use_ai || self.methods.contains(&Method::Ai)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            server_timeout: Duration::from_secs(self.timeout),
            detectors: self.detectors(),
            detection: DetectionConfig {
                consistency_threshold: self.consistency_threshold,
                disagreement_margin: self.disagreement_margin,
                cross_server_margin: self.cross_server_margin,
                summary_max_chars: self.summary_max_chars,
            },
            provider_concurrency: self.provider_concurrency,
            provider_timeout: Duration::from_secs(self.provider_timeout),
        }
    }

    /// Environment defaults with command-line overrides applied.
    pub fn embedding_config(&self) -> EmbeddingConfig {
        let mut config = EmbeddingConfig::from_env();
        if let Some(key) = &self.api_key {
            config.openai_api_key = Some(key.clone());
        }
        if let Some(provider) = &self.embedding_provider {
            config.provider = provider.clone();
            config.model = embedding_config::default_model(provider).to_string();
            config.dimensions = embedding_config::default_dimensions(provider);
        }
        if let Some(model) = &self.embedding_model {
            config.model = model.clone();
        }
        if let Some(url) = &self.ollama_url {
            config.ollama_base_url = url.clone();
        }
        config
    }

    /// Environment defaults with command-line overrides applied.
    pub fn judge_config(&self) -> JudgeConfig {
        let mut config = JudgeConfig::from_env();
        if let Some(key) = &self.api_key {
            config.openai_api_key = Some(key.clone());
        }
        if let Some(provider) = &self.judge_provider {
            config.provider = provider.clone();
            config.model = judge_config::default_model(provider).to_string();
        }
        if let Some(model) = &self.judge_model {
            config.model = model.clone();
        }
        if let Some(url) = &self.ollama_url {
            config.ollama_base_url = url.clone();
        }
        config
    }
}
