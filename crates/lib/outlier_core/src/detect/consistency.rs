// @zen-component: DET-ConsistencyDetector
//
//! Consistency detector: does a tool fit the server that hosts it?
//!
//! Both methods compare the tool against its leave-one-out baseline, so a
//! tool never vouches for itself. Tools that are their server's only tool get
//! no consistency score at all.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Assessment, DetectionConfig, Detector};
use crate::context::{ScanSnapshot, ToolSlot};
use crate::embedding::cosine_similarity;
use crate::gate::ProviderGate;
use crate::judge::{JudgeProvider, JudgeRequest, ServerSummary};
use crate::models::detection::clamp_unit;
use crate::models::{DetectionMethod, DetectionScore, DetectorKind};

pub struct ConsistencyDetector {
    judge: Option<Arc<dyn JudgeProvider>>,
    gate: ProviderGate,
    threshold: f64,
    disagreement_margin: f64,
}

impl ConsistencyDetector {
    pub fn new(
        judge: Option<Arc<dyn JudgeProvider>>,
        gate: ProviderGate,
        config: &DetectionConfig,
    ) -> Self {
        Self {
            judge,
            gate,
            threshold: config.consistency_threshold,
            disagreement_margin: config.disagreement_margin,
        }
    }
}

#[async_trait]
impl Detector for ConsistencyDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Consistency
    }

    async fn assess(&self, slot: ToolSlot, snapshot: &ScanSnapshot) -> Assessment {
        let mut assessment = Assessment::default();
        let (Some(host), Some(entry)) = (snapshot.server(slot.server), snapshot.tool(slot)) else {
            return assessment;
        };
        let Some(baseline) = entry.baseline.as_ref() else {
            return assessment;
        };

        let mut embedding_score = None;
        if let (Some(tool_vec), Some(base_vec)) = (&entry.embedding, &baseline.embedding)
            && let Some(similarity) = cosine_similarity(tool_vec, base_vec)
        {
            let value = clamp_unit(1.0 - similarity);
            embedding_score = Some(value);
            assessment.scores.push(DetectionScore::new(
                DetectorKind::Consistency,
                DetectionMethod::Embedding,
                value,
                value > self.threshold,
                format!(
                    "similarity {similarity:.2} to the other tools of '{}'",
                    host.name
                ),
            ));
        }

        let mut judged_score = None;
        if let Some(judge) = &self.judge {
            let request = JudgeRequest::HostFit {
                tool_name: entry.tool.name.clone(),
                tool_description: entry.tool.description.clone(),
                host: ServerSummary {
                    name: host.name.clone(),
                    summary: baseline.summary.clone(),
                },
            };
            let label = format!("judge:consistency:{}/{}", host.name, entry.tool.name);
            if let Some(judgment) = self.gate.run(&label, judge.judge(&request)).await {
                let value = clamp_unit(1.0 - judgment.fit);
                judged_score = Some(value);
                assessment.scores.push(DetectionScore::new(
                    DetectorKind::Consistency,
                    DetectionMethod::Judged,
                    value,
                    value > self.threshold,
                    format!(
                        "fit {:.2} with '{}': {}",
                        judgment.fit, host.name, judgment.rationale
                    ),
                ));
            }
        }

        if let (Some(embedding), Some(judged)) = (embedding_score, judged_score) {
            let gap = (embedding - judged).abs();
            if gap > self.disagreement_margin {
                assessment.advisories.push(format!(
                    "Embedding ({embedding:.2}) and LLM ({judged:.2}) consistency scores disagree \
                     by {gap:.2}; review manually"
                ));
            }
        }

        assessment
    }
}
