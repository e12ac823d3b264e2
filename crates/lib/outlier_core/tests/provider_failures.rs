//! Scans where one provider is down: the other method still scores.

mod common;

use std::sync::Arc;

use common::{
    Behavior, FILES, FS_WITH_CVE, FailingEmbedder, FailingJudge, KeywordJudge, NET, StubLister,
    descriptors, engine,
};
use outlier_core::models::{DetectionMethod, DetectorKind, DeviationResult};
use outlier_core::{OutlierScanner, ScanOptions};
use tokio_util::sync::CancellationToken;

fn lister() -> StubLister {
    StubLister::new()
        .server("files", Behavior::Tools(FILES.to_vec()))
        .server("net", Behavior::Tools(NET.to_vec()))
        .server("fs", Behavior::Tools(FS_WITH_CVE.to_vec()))
}

fn find<'a>(results: &'a [DeviationResult], server: &str, tool: &str) -> &'a DeviationResult {
    results
        .iter()
        .find(|r| r.tool.server_name == server && r.tool.name == tool)
        .unwrap_or_else(|| panic!("no result for {server}/{tool}"))
}

#[tokio::test]
async fn failing_judge_keeps_embedding_scores() {
    let report = engine(lister(), ScanOptions::default())
        .with_judge(Arc::new(FailingJudge))
        .run(&descriptors(&["files", "net", "fs"]), CancellationToken::new())
        .await
        .expect("scan");

    let scores: Vec<_> = report.results.iter().flat_map(|r| &r.scores).collect();
    assert!(!scores.is_empty());
    assert!(scores.iter().all(|s| s.method == DetectionMethod::Embedding));

    let proxy = find(&report.results, "files", "http_post_proxy");
    assert!(proxy.is_deviation);
    assert!(
        proxy
            .scores
            .iter()
            .any(|s| s.detector == DetectorKind::CrossServer && s.flagged)
    );

    let cve = find(&report.results, "fs", "get_cve");
    assert_eq!(cve.scores.len(), 2);
    assert!(cve.is_deviation);
    assert!(cve.advisories.is_empty());
}

#[tokio::test]
async fn failing_embedder_keeps_judged_scores() {
    let engine = OutlierScanner::new(
        Arc::new(lister()),
        Arc::new(FailingEmbedder),
        ScanOptions::default(),
    )
    .with_judge(Arc::new(KeywordJudge));
    let report = engine
        .run(&descriptors(&["files", "net", "fs"]), CancellationToken::new())
        .await
        .expect("scan");

    assert_eq!(report.summary.successful_scans, 3);
    let scores: Vec<_> = report.results.iter().flat_map(|r| &r.scores).collect();
    assert!(!scores.is_empty());
    assert!(scores.iter().all(|s| s.method == DetectionMethod::Judged));

    let proxy = find(&report.results, "files", "http_post_proxy");
    let cross = proxy
        .scores
        .iter()
        .find(|s| s.detector == DetectorKind::CrossServer)
        .expect("judged cross-server score");
    assert!(cross.flagged);
    assert!(cross.detail.contains("'net'"), "{}", cross.detail);

    let cve = find(&report.results, "fs", "get_cve");
    assert_eq!(cve.scores.len(), 2);
    let consistency = cve
        .scores
        .iter()
        .find(|s| s.detector == DetectorKind::Consistency)
        .expect("judged consistency score");
    assert!(consistency.flagged);
    assert!(cve.is_deviation);
}

#[tokio::test]
async fn both_providers_down_means_no_scores_not_zero_scores() {
    let engine = OutlierScanner::new(
        Arc::new(lister()),
        Arc::new(FailingEmbedder),
        ScanOptions::default(),
    )
    .with_judge(Arc::new(FailingJudge));
    let report = engine
        .run(&descriptors(&["files", "net", "fs"]), CancellationToken::new())
        .await
        .expect("scan");

    assert_eq!(report.results.len(), 9);
    for result in &report.results {
        assert!(result.scores.is_empty(), "{}", result.tool.name);
        assert!(!result.is_deviation);
    }
    assert_eq!(report.summary.deviations_found, 0);
}
