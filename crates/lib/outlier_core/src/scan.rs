//! Scan orchestration: scanner, then context builder, then detectors.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{ConfigError, validate_unit};
use crate::context::ContextBuilder;
use crate::detect::{
    ConsistencyDetector, CrossServerDetector, DetectionConfig, DetectionOutcome, Detector,
    DetectorManager,
};
use crate::embedding::EmbeddingProvider;
use crate::gate::{DEFAULT_PROVIDER_CONCURRENCY, DEFAULT_PROVIDER_TIMEOUT, ProviderGate};
use crate::judge::JudgeProvider;
use crate::models::{DetectorKind, DeviationResult, ScanSummary, Server, ServerDescriptor};
use crate::scanner::{DEFAULT_SERVER_TIMEOUT, ServerScanner, ToolLister};

/// Knobs for one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub server_timeout: Duration,
    /// Detectors to run, in this order.
    pub detectors: Vec<DetectorKind>,
    pub detection: DetectionConfig,
    pub provider_concurrency: usize,
    pub provider_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            server_timeout: DEFAULT_SERVER_TIMEOUT,
            detectors: vec![DetectorKind::Consistency, DetectorKind::CrossServer],
            detection: DetectionConfig::default(),
            provider_concurrency: DEFAULT_PROVIDER_CONCURRENCY,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl ScanOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detectors.is_empty() {
            return Err(ConfigError::NoDetectors);
        }
        validate_unit("consistency threshold", self.detection.consistency_threshold)?;
        validate_unit("disagreement margin", self.detection.disagreement_margin)?;
        validate_unit("cross-server margin", self.detection.cross_server_margin)?;
        if self.detection.summary_max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "summary length must be at least 1 character".to_string(),
            ));
        }
        if self.server_timeout.is_zero() || self.provider_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything one scan produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    /// One entry per configured server, in configured order.
    pub servers: Vec<Server>,
    /// One entry per assessed tool, in server order then tool order.
    pub results: Vec<DeviationResult>,
    pub summary: ScanSummary,
}

impl ScanReport {
    pub fn deviations(&self) -> impl Iterator<Item = &DeviationResult> {
        self.results.iter().filter(|r| r.is_deviation)
    }
}

/// The hybrid detection engine.
pub struct OutlierScanner {
    lister: Arc<dyn ToolLister>,
    embedder: Arc<dyn EmbeddingProvider>,
    judge: Option<Arc<dyn JudgeProvider>>,
    options: ScanOptions,
}

impl OutlierScanner {
    pub fn new(
        lister: Arc<dyn ToolLister>,
        embedder: Arc<dyn EmbeddingProvider>,
        options: ScanOptions,
    ) -> Self {
        Self {
            lister,
            embedder,
            judge: None,
            options,
        }
    }

    /// Enable the judged method for every detector.
    pub fn with_judge(mut self, judge: Arc<dyn JudgeProvider>) -> Self {
        self.judge = Some(judge);
        self
    }

    fn detectors(&self, gate: &ProviderGate) -> Vec<Arc<dyn Detector>> {
        let mut seen = Vec::with_capacity(self.options.detectors.len());
        self.options
            .detectors
            .iter()
            .copied()
            .filter(|k| {
                let fresh = !seen.contains(k);
                seen.push(*k);
                fresh
            })
            .map(|kind| -> Arc<dyn Detector> {
                match kind {
                    DetectorKind::Consistency => Arc::new(ConsistencyDetector::new(
                        self.judge.clone(),
                        gate.clone(),
                        &self.options.detection,
                    )),
                    DetectorKind::CrossServer => Arc::new(CrossServerDetector::new(
                        self.judge.clone(),
                        gate.clone(),
                        &self.options.detection,
                    )),
                }
            })
            .collect()
    }

    /// Run one full scan.
    ///
    /// Only configuration problems are errors; unreachable servers and failed
    /// provider calls are recorded in the report. Cancelling `cancel` returns
    /// a partial report with `summary.cancelled` set.
    pub async fn run(
        &self,
        descriptors: &[ServerDescriptor],
        cancel: CancellationToken,
    ) -> Result<ScanReport, ConfigError> {
        if descriptors.is_empty() {
            return Err(ConfigError::NoServers);
        }
        self.options.validate()?;

        let gate = ProviderGate::new(
            self.options.provider_concurrency,
            self.options.provider_timeout,
            cancel.clone(),
        );
        let manager = DetectorManager::new(self.detectors(&gate));

        info!(
            servers = descriptors.len(),
            timeout_secs = self.options.server_timeout.as_secs_f64(),
            "Scanning MCP servers"
        );
        let scanner = ServerScanner::new(self.lister.clone(), self.options.server_timeout);
        let servers = scanner.scan_all(descriptors, &cancel).await;

        let builder = ContextBuilder::new(
            self.embedder.clone(),
            gate.clone(),
            self.options.detection.summary_max_chars,
        );
        let snapshot = Arc::new(builder.build(&servers).await);

        info!(
            detectors = ?manager.kinds(),
            judged = self.judge.is_some(),
            tools = snapshot.tool_count(),
            "Running detectors"
        );
        let DetectionOutcome {
            results,
            mut summary,
        } = manager.run(&servers, snapshot, &cancel).await;
        summary.cancelled |= cancel.is_cancelled();

        Ok(ScanReport {
            servers,
            results,
            summary,
        })
    }
}
