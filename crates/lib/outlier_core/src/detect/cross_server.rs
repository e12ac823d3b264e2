// @zen-component: DET-CrossServerDetector
//
//! Cross-server detector: does a tool fit some other server better than its
//! own?
//!
//! For each method the best foreign fit is tracked across all other servers
//! with a context, in configured order. Only a strictly better fit replaces
//! the current best, so ties go to the earlier server. The host's fit is
//! taken from the tool's leave-one-out baseline. A host's only tool has no
//! baseline and is measured against the full host context instead, which
//! includes the tool itself; the detail says so.
//!
//! Tool shadowing (a tool that mimics another server's tool) shows up here as
//! an extreme foreign fit. For a single-tool host the inflated own fit hides
//! that, so a foreign fit within the margin of it raises an advisory.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;

use super::{Assessment, DetectionConfig, Detector};
use crate::context::{ScanSnapshot, ServerEntry, ToolEntry, ToolSlot};
use crate::embedding::cosine_similarity;
use crate::gate::ProviderGate;
use crate::judge::{JudgeProvider, JudgeRequest, ServerSummary};
use crate::models::{DetectionMethod, DetectionScore, DetectorKind};

pub struct CrossServerDetector {
    judge: Option<Arc<dyn JudgeProvider>>,
    gate: ProviderGate,
    margin: f64,
}

/// Best foreign fit so far: server name and fit value.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BestFit<'a> {
    server: &'a str,
    fit: f64,
}

/// Keep the first maximum: only a strictly greater fit wins.
fn best_fit<'a>(fits: impl IntoIterator<Item = (&'a str, f64)>) -> Option<BestFit<'a>> {
    let mut best: Option<BestFit<'a>> = None;
    for (server, fit) in fits {
        if best.is_none_or(|b| fit > b.fit) {
            best = Some(BestFit { server, fit });
        }
    }
    best
}

/// What the host's own fit is measured against.
#[derive(Debug, Clone, Copy)]
struct OwnContext<'a> {
    embedding: Option<&'a [f32]>,
    summary: &'a str,
    /// Full host context of a single-tool host.
    includes_tool: bool,
}

impl<'a> OwnContext<'a> {
    fn of(host: &'a ServerEntry, entry: &'a ToolEntry) -> Option<Self> {
        if let Some(baseline) = &entry.baseline {
            return Some(Self {
                embedding: baseline.embedding.as_deref(),
                summary: &baseline.summary,
                includes_tool: false,
            });
        }
        host.context.as_ref().map(|context| Self {
            embedding: context.embedding.as_deref(),
            summary: &context.summary,
            includes_tool: true,
        })
    }
}

impl CrossServerDetector {
    pub fn new(
        judge: Option<Arc<dyn JudgeProvider>>,
        gate: ProviderGate,
        config: &DetectionConfig,
    ) -> Self {
        Self {
            judge,
            gate,
            margin: config.cross_server_margin,
        }
    }

    fn record(
        &self,
        assessment: &mut Assessment,
        method: DetectionMethod,
        host: &str,
        best: BestFit<'_>,
        own: f64,
        own_context: OwnContext<'_>,
    ) {
        let diff = best.fit - own;
        let flagged = diff > self.margin;
        let lead = if flagged {
            format!("better fit with '{}'", best.server)
        } else {
            format!("closest foreign server '{}'", best.server)
        };
        let note = if own_context.includes_tool {
            "; own context includes the tool"
        } else {
            ""
        };
        assessment.scores.push(DetectionScore::new(
            DetectorKind::CrossServer,
            method,
            diff,
            flagged,
            format!(
                "{lead} ({method}: {:.2} vs {own:.2}, diff {diff:+.2}{note})",
                best.fit
            ),
        ));

        if own_context.includes_tool && !flagged && diff >= -self.margin {
            assessment.advisories.push(format!(
                "'{host}' has a single tool and '{}' fits it about as well ({method}: {:.2} vs \
                 {own:.2}); possible shadowed tool",
                best.server, best.fit
            ));
        }
    }

    fn embedding_fit<'a>(
        &self,
        entry: &ToolEntry,
        own_context: OwnContext<'_>,
        candidates: &[&'a ServerEntry],
    ) -> Option<(BestFit<'a>, f64)> {
        let tool_vec = entry.embedding.as_deref()?;
        let own = cosine_similarity(tool_vec, own_context.embedding?)?;

        let best = best_fit(candidates.iter().filter_map(|candidate| {
            let vec = candidate.context.as_ref()?.embedding.as_deref()?;
            Some((candidate.name.as_str(), cosine_similarity(tool_vec, vec)?))
        }))?;

        Some((best, own))
    }

    async fn judged_fit<'a>(
        &self,
        host: &ServerEntry,
        entry: &ToolEntry,
        own_context: OwnContext<'_>,
        candidates: &[&'a ServerEntry],
    ) -> Option<(BestFit<'a>, f64)> {
        let judge = self.judge.as_ref()?;
        let host_summary = ServerSummary {
            name: host.name.clone(),
            summary: own_context.summary.to_string(),
        };

        let own_request = JudgeRequest::HostFit {
            tool_name: entry.tool.name.clone(),
            tool_description: entry.tool.description.clone(),
            host: host_summary.clone(),
        };
        let own_label = format!("judge:cross-server:{}/{}@own", host.name, entry.tool.name);
        let own = self.gate.run(&own_label, judge.judge(&own_request)).await?;

        let requests: Vec<(&'a str, JudgeRequest)> = candidates
            .iter()
            .filter_map(|candidate| {
                let summary = candidate.summary()?;
                Some((
                    candidate.name.as_str(),
                    JudgeRequest::CandidateFit {
                        tool_name: entry.tool.name.clone(),
                        tool_description: entry.tool.description.clone(),
                        candidate: summary,
                        host: host_summary.clone(),
                    },
                ))
            })
            .collect();

        let fits = join_all(requests.iter().map(|(server, request)| async move {
            let label = format!("judge:cross-server:{}/{}@{server}", host.name, entry.tool.name);
            let judgment = self.gate.run(&label, judge.judge(request)).await;
            judgment.map(|j| (*server, j.fit))
        }))
        .await;

        let best = best_fit(fits.into_iter().flatten())?;
        Some((best, own.fit))
    }
}

#[async_trait]
impl Detector for CrossServerDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::CrossServer
    }

    async fn assess(&self, slot: ToolSlot, snapshot: &ScanSnapshot) -> Assessment {
        let mut assessment = Assessment::default();
        let (Some(host), Some(entry)) = (snapshot.server(slot.server), snapshot.tool(slot)) else {
            return assessment;
        };
        let Some(own_context) = OwnContext::of(host, entry) else {
            return assessment;
        };

        let candidates: Vec<&ServerEntry> = snapshot
            .candidates(slot.server)
            .map(|(candidate, _)| candidate)
            .collect();
        if candidates.is_empty() {
            return assessment;
        }

        if let Some((best, own)) = self.embedding_fit(entry, own_context, &candidates) {
            let method = DetectionMethod::Embedding;
            self.record(&mut assessment, method, &host.name, best, own, own_context);
        }
        if let Some((best, own)) = self.judged_fit(host, entry, own_context, &candidates).await {
            let method = DetectionMethod::Judged;
            self.record(&mut assessment, method, &host.name, best, own, own_context);
        }

        assessment
    }
}
