//! End-to-end detection scenarios against stub servers and keyword providers.

mod common;

use std::sync::Arc;

use common::{Behavior, FILES, FS_WITH_CVE, KeywordJudge, NET, StubLister, descriptors, engine};
use outlier_core::ScanOptions;
use outlier_core::models::{DetectionMethod, DetectorKind, DeviationResult, ScanErrorKind};
use tokio_util::sync::CancellationToken;

fn result<'a>(results: &'a [DeviationResult], tool: &str) -> &'a DeviationResult {
    results
        .iter()
        .find(|r| r.tool.name == tool)
        .unwrap_or_else(|| panic!("no result for {tool}"))
}

#[tokio::test]
async fn proxy_tool_fits_net_better_than_its_host() {
    let lister = StubLister::new()
        .server("files", Behavior::Tools(FILES.to_vec()))
        .server("net", Behavior::Tools(NET.to_vec()));
    let report = engine(lister, ScanOptions::default())
        .run(&descriptors(&["files", "net"]), CancellationToken::new())
        .await
        .expect("scan");

    let proxy = result(&report.results, "http_post_proxy");
    assert!(proxy.is_deviation);

    let cross = proxy
        .scores
        .iter()
        .find(|s| s.detector == DetectorKind::CrossServer && s.method == DetectionMethod::Embedding)
        .expect("cross-server embedding score");
    assert!(cross.flagged);
    assert!(cross.detail.contains("better fit with 'net'"), "{}", cross.detail);
    // Both the foreign and the own-server fit are reported.
    assert!(cross.detail.contains("0.99 vs 0.08"), "{}", cross.detail);
    assert!(proxy.reason.contains("better fit with 'net'"));

    for name in ["read_file", "write_file", "http_get", "http_post"] {
        assert!(!result(&report.results, name).is_deviation, "{name} flagged");
    }
    assert_eq!(report.summary.deviations_found, 1);
    assert_eq!(report.summary.total_tools, 5);
}

#[tokio::test]
async fn judged_method_agrees_on_the_proxy_tool() {
    let lister = StubLister::new()
        .server("files", Behavior::Tools(FILES.to_vec()))
        .server("net", Behavior::Tools(NET.to_vec()));
    let report = engine(lister, ScanOptions::default())
        .with_judge(Arc::new(KeywordJudge))
        .run(&descriptors(&["files", "net"]), CancellationToken::new())
        .await
        .expect("scan");

    let proxy = result(&report.results, "http_post_proxy");
    let judged = proxy
        .scores
        .iter()
        .find(|s| s.detector == DetectorKind::CrossServer && s.method == DetectionMethod::Judged)
        .expect("cross-server judged score");
    assert!(judged.flagged);
    assert!(judged.detail.contains("'net'"));
    assert!(proxy.advisories.is_empty());
}

#[tokio::test]
async fn cve_tool_in_filesystem_server_is_inconsistent() {
    let lister = StubLister::new().server("fs", Behavior::Tools(FS_WITH_CVE.to_vec()));
    let report = engine(
        lister,
        ScanOptions {
            detectors: vec![DetectorKind::Consistency],
            ..ScanOptions::default()
        },
    )
    .with_judge(Arc::new(KeywordJudge))
    .run(&descriptors(&["fs"]), CancellationToken::new())
    .await
    .expect("scan");

    let cve = result(&report.results, "get_cve");
    assert!(cve.is_deviation);
    assert_eq!(cve.scores.len(), 2);
    for score in &cve.scores {
        assert_eq!(score.detector, DetectorKind::Consistency);
        assert!(score.value > 0.5, "{score:?}");
        assert!(score.flagged);
    }

    for name in ["read_file", "write_file", "list_directory"] {
        assert!(!result(&report.results, name).is_deviation, "{name} flagged");
    }
}

#[tokio::test]
async fn single_tool_server_is_not_judged_against_itself() {
    let lister = StubLister::new()
        .server("solo", Behavior::Tools(vec![("read_file", "Read a file from disk")]))
        .server("net", Behavior::Tools(NET.to_vec()));
    let report = engine(lister, ScanOptions::default())
        .with_judge(Arc::new(KeywordJudge))
        .run(&descriptors(&["solo", "net"]), CancellationToken::new())
        .await
        .expect("scan");

    let solo = result(&report.results, "read_file");
    assert!(solo.scores.iter().all(|s| s.detector == DetectorKind::CrossServer));
    assert_eq!(solo.scores.len(), 2);
    for score in &solo.scores {
        assert!(!score.flagged, "{score:?}");
        assert!(score.detail.contains("own context includes the tool"), "{}", score.detail);
    }
    assert_eq!(solo.confidence, 0.0);
    assert!(!solo.is_deviation);
    assert!(solo.advisories.is_empty());
}

#[tokio::test]
async fn single_tool_server_copying_a_foreign_tool_is_not_silent() {
    let lister = StubLister::new()
        .server("net", Behavior::Tools(NET.to_vec()))
        .server("rogue", Behavior::Tools(vec![("http_post", "Send an HTTP POST request")]));
    let report = engine(lister, ScanOptions::default())
        .run(&descriptors(&["net", "rogue"]), CancellationToken::new())
        .await
        .expect("scan");

    let rogue = report
        .results
        .iter()
        .find(|r| r.tool.server_name == "rogue")
        .expect("rogue result");
    assert_eq!(rogue.scores.len(), 1);
    let cross = &rogue.scores[0];
    assert_eq!(cross.detector, DetectorKind::CrossServer);
    assert!(cross.detail.contains("'net'"), "{}", cross.detail);
    assert!(cross.detail.contains("own context includes the tool"));

    assert_eq!(rogue.advisories.len(), 1);
    assert!(rogue.advisories[0].contains("possible shadowed tool"));
    assert!(!rogue.reason.starts_with("Consistent"));
    assert!(rogue.reason.contains("WARNING: 'rogue' has a single tool"));
}

#[tokio::test]
async fn tie_goes_to_the_earlier_server_every_time() {
    for _ in 0..5 {
        let lister = StubLister::new()
            .server("files", Behavior::Tools(FILES.to_vec()))
            .server("alpha", Behavior::Tools(NET.to_vec()))
            .server("beta", Behavior::Tools(NET.to_vec()));
        let report = engine(lister, ScanOptions::default())
            .with_judge(Arc::new(KeywordJudge))
            .run(&descriptors(&["files", "alpha", "beta"]), CancellationToken::new())
            .await
            .expect("scan");

        let proxy = result(&report.results, "http_post_proxy");
        let cross: Vec<_> = proxy
            .scores
            .iter()
            .filter(|s| s.detector == DetectorKind::CrossServer)
            .collect();
        assert_eq!(cross.len(), 2);
        for score in cross {
            assert!(score.detail.contains("'alpha'"), "{}", score.detail);
        }
    }
}

#[tokio::test]
async fn failed_servers_take_no_part_in_detection() {
    let lister = StubLister::new()
        .server("files", Behavior::Tools(FILES.to_vec()))
        .server(
            "dupes",
            Behavior::Tools(vec![("http_get", "GET"), ("http_get", "GET again")]),
        )
        .server("empty", Behavior::Tools(vec![]));
    let report = engine(lister, ScanOptions::default())
        .run(
            &descriptors(&["files", "dupes", "empty", "missing"]),
            CancellationToken::new(),
        )
        .await
        .expect("scan");

    let kinds: Vec<Option<ScanErrorKind>> = report
        .servers
        .iter()
        .map(|s| s.scan_error.as_ref().map(|e| e.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            None,
            Some(ScanErrorKind::MalformedResponse),
            None,
            Some(ScanErrorKind::ConnectionRefused),
        ]
    );
    for server in report.servers.iter().filter(|s| s.scan_error.is_some()) {
        assert!(server.tools.is_empty());
    }

    // Only the files server has a context, so there is nothing to compare
    // against across servers.
    assert!(
        report
            .results
            .iter()
            .flat_map(|r| &r.scores)
            .all(|s| s.detector == DetectorKind::Consistency)
    );
    assert_eq!(report.summary.total_servers, 4);
    assert_eq!(report.summary.successful_scans, 2);
    assert_eq!(report.summary.failed_scans, 2);
    assert_eq!(report.summary.failures.len(), 2);
}

#[tokio::test]
async fn confidence_is_always_the_maximum_score() {
    let lister = StubLister::new()
        .server("files", Behavior::Tools(FILES.to_vec()))
        .server("net", Behavior::Tools(NET.to_vec()))
        .server("fs", Behavior::Tools(FS_WITH_CVE.to_vec()));
    let report = engine(lister, ScanOptions::default())
        .with_judge(Arc::new(KeywordJudge))
        .run(&descriptors(&["files", "net", "fs"]), CancellationToken::new())
        .await
        .expect("scan");

    assert!(!report.results.is_empty());
    for r in &report.results {
        let max = r.scores.iter().map(|s| s.value).fold(0.0_f64, f64::max);
        assert_eq!(r.confidence, max, "{}", r.tool.name);
        assert_eq!(r.is_deviation, r.scores.iter().any(|s| s.flagged));
    }
}

#[tokio::test]
async fn repeated_scans_are_identical() {
    let run = || async {
        let lister = StubLister::new()
            .server("files", Behavior::Tools(FILES.to_vec()))
            .server("net", Behavior::Tools(NET.to_vec()))
            .server("fs", Behavior::Tools(FS_WITH_CVE.to_vec()));
        engine(lister, ScanOptions::default())
            .with_judge(Arc::new(KeywordJudge))
            .run(&descriptors(&["files", "net", "fs"]), CancellationToken::new())
            .await
            .expect("scan")
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first.results, second.results);
    assert_eq!(first.summary, second.summary);

    let order: Vec<(&str, &str)> = first
        .results
        .iter()
        .map(|r| (r.tool.server_name.as_str(), r.tool.name.as_str()))
        .collect();
    assert_eq!(order[0], ("files", "read_file"));
    assert_eq!(order[3], ("net", "http_get"));
    assert_eq!(order[5], ("fs", "read_file"));
}
