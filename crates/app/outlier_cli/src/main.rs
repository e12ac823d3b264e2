// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use cli::{Cli, OutputFormat};
use log::{debug, info, warn};
use outlier_core::config::{self, ConfigError};
use outlier_core::report::JsonReport;
use outlier_core::scanner::transport::RmcpToolLister;
use outlier_core::{OutlierScanner, embedding, judge};
use tokio_util::sync::CancellationToken;

mod cli;
mod logging;
mod render;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    let args = Cli::parse();

    logging::init(args.debug)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(scan(args))
}

async fn scan(args: Cli) -> Result<()> {
    let servers = config::load_servers(&args.config)?;
    info!("Found {} MCP servers in {}", servers.len(), args.config.display());
    for server in &servers {
        debug!("  - {}: {}", server.name, server.transport.endpoint());
    }

    let embedding_config = args.embedding_config();
    let embedder = embedding::build_provider(&embedding_config).map_err(ConfigError::from)?;
    info!(
        "Embedding provider: {} ({})",
        embedding_config.provider, embedding_config.model
    );

    let mut engine = OutlierScanner::new(
        Arc::new(RmcpToolLister::new()),
        embedder,
        args.scan_options(),
    );
    if args.judged() {
        let judge_config = args.judge_config();
        let judge = judge::build_provider(&judge_config).map_err(ConfigError::from)?;
        info!(
            "LLM judgment enabled: {} ({})",
            judge_config.provider, judge_config.model
        );
        engine = engine.with_judge(judge);
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing with partial results");
            interrupt.cancel();
        }
    });

    let report = engine.run(&servers, cancel).await?;

    let rendered = match args.output {
        OutputFormat::Text => render::text(&report, args.debug)?,
        OutputFormat::Json => JsonReport::new(&report, Utc::now()).to_json_pretty()?,
    };
    println!("{rendered}");

    if let Some(path) = &args.save {
        std::fs::write(path, &rendered)?;
        info!("Report saved to {}", path.display());
    }

    Ok(())
}
