// @zen-component: DET-DetectorManager
//
//! Detector manager. Runs the enabled detectors over every tool.
//!
//! One task per tool evaluates every detector in order and sends the merged
//! [`DeviationResult`] to a single collector. The collector restores
//! server-then-tool order before returning. When the scan is cancelled,
//! outstanding tasks are aborted and whatever was already collected is kept.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Detector;
use crate::context::{ScanSnapshot, ToolSlot};
use crate::models::{DetectorKind, DeviationResult, ScanSummary, Server, ServerFailure};

/// Results of one detection pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionOutcome {
    /// Ordered by configured server order, then reported tool order.
    pub results: Vec<DeviationResult>,
    pub summary: ScanSummary,
}

pub struct DetectorManager {
    detectors: Vec<Arc<dyn Detector>>,
}

impl DetectorManager {
    pub fn new(detectors: Vec<Arc<dyn Detector>>) -> Self {
        Self { detectors }
    }

    pub fn kinds(&self) -> Vec<DetectorKind> {
        self.detectors.iter().map(|d| d.kind()).collect()
    }

    /// Run every detector against every tool in `snapshot`.
    ///
    /// `servers` is the scanner output the snapshot was built from; it feeds
    /// the scan counters.
    pub async fn run(
        &self,
        servers: &[Server],
        snapshot: Arc<ScanSnapshot>,
        cancel: &CancellationToken,
    ) -> DetectionOutcome {
        let mut summary = summarize_servers(servers);

        let (tx, mut rx) = mpsc::unbounded_channel::<(ToolSlot, DeviationResult)>();
        let mut tasks = JoinSet::new();

        for slot in snapshot.slots() {
            let detectors = self.detectors.clone();
            let snapshot = snapshot.clone();
            let tx = tx.clone();

            tasks.spawn(async move {
                let Some(entry) = snapshot.tool(slot) else {
                    return;
                };
                let mut scores = Vec::new();
                let mut advisories = Vec::new();
                for detector in &detectors {
                    let assessment = detector.assess(slot, &snapshot).await;
                    scores.extend(assessment.scores);
                    advisories.extend(assessment.advisories);
                }
                let result = DeviationResult::from_scores(entry.tool.clone(), scores, advisories);
                let _ = tx.send((slot, result));
            });
        }
        drop(tx);

        let mut collected = Vec::with_capacity(snapshot.tool_count());
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    tasks.abort_all();
                    break;
                }
                message = rx.recv() => match message {
                    Some(item) => collected.push(item),
                    None => break,
                },
            }
        }
        while let Ok(item) = rx.try_recv() {
            collected.push(item);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined
                && !e.is_cancelled()
            {
                warn!("Detection task failed: {e}");
            }
        }

        collected.sort_by_key(|(slot, _)| *slot);
        let results: Vec<DeviationResult> = collected.into_iter().map(|(_, r)| r).collect();

        summary.deviations_found = results.iter().filter(|r| r.is_deviation).count();
        if summary.cancelled {
            warn!(
                assessed = results.len(),
                total = snapshot.tool_count(),
                "Detection cancelled; returning partial results"
            );
        } else {
            info!(
                tools = results.len(),
                deviations = summary.deviations_found,
                "Detection complete"
            );
        }
        for result in results.iter().filter(|r| r.is_deviation) {
            debug!(
                server = %result.tool.server_name,
                tool = %result.tool.name,
                confidence = result.confidence,
                "Deviation"
            );
        }

        DetectionOutcome { results, summary }
    }
}

/// Server-level counters; detection fills in `deviations_found`.
pub fn summarize_servers(servers: &[Server]) -> ScanSummary {
    let failures: Vec<ServerFailure> = servers
        .iter()
        .filter_map(|s| {
            s.scan_error.as_ref().map(|e| ServerFailure {
                server: s.name.clone(),
                kind: e.kind,
                message: e.message.clone(),
            })
        })
        .collect();

    ScanSummary {
        total_servers: servers.len(),
        successful_scans: servers.len() - failures.len(),
        failed_scans: failures.len(),
        total_tools: servers.iter().map(|s| s.tools.len()).sum(),
        deviations_found: 0,
        failures,
        cancelled: false,
    }
}
