use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn outlier() -> Command {
    let mut cmd = Command::cargo_bin("mcp-outlier").expect("binary");
    for var in [
        "OPENAI_API_KEY",
        "EMBEDDING_PROVIDER",
        "EMBEDDING_ACTIVE_MODEL",
        "JUDGE_PROVIDER",
        "JUDGE_MODEL",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn config_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(json.as_bytes()).expect("write config");
    file
}

const UNREACHABLE: &str = r#"{"mcpServers": {
    "ghost": {"command": "/nonexistent/mcp-outlier-test-server"}
}}"#;

#[test]
fn help_lists_options() {
    outlier()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--methods"))
        .stdout(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn version_prints_package_version() {
    outlier()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_config_file_fails() {
    outlier()
        .args(["--config", "/nonexistent/claude_desktop_config.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn empty_server_map_fails() {
    let config = config_file(r#"{"mcpServers": {}}"#);
    outlier()
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No MCP servers configured"));
}

#[test]
fn out_of_range_threshold_fails() {
    let config = config_file(UNREACHABLE);
    outlier()
        .arg("--config")
        .arg(config.path())
        .args(["--embedding-provider", "local", "--consistency-threshold", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be between 0 and 1"));
}

#[test]
fn unreachable_server_is_reported_not_fatal() {
    let config = config_file(UNREACHABLE);
    outlier()
        .arg("--config")
        .arg(config.path())
        .args(["--embedding-provider", "local", "--timeout", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[failed] ghost"))
        .stdout(predicate::str::contains("connection-refused"))
        .stdout(predicate::str::contains("No deviations detected"));
}

#[test]
fn json_output_is_saved() {
    let config = config_file(UNREACHABLE);
    let dir = tempfile::tempdir().expect("tempdir");
    let saved = dir.path().join("report.json");

    let output = outlier()
        .arg("--config")
        .arg(config.path())
        .args(["--embedding-provider", "local", "--output", "json", "--save"])
        .arg(&saved)
        .output()
        .expect("run");
    assert!(output.status.success());

    let stdout: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(stdout["summary"]["total_servers"], 1);
    assert_eq!(stdout["summary"]["failed_scans"], 1);
    assert_eq!(stdout["servers"][0]["name"], "ghost");
    assert_eq!(stdout["servers"][0]["error_kind"], "connection-refused");
    assert!(stdout["deviations"].as_array().expect("array").is_empty());

    let file: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&saved).expect("saved report"))
            .expect("json file");
    assert_eq!(file, stdout);
}

#[test]
fn unsupported_embedding_provider_fails() {
    let config = config_file(UNREACHABLE);
    outlier()
        .arg("--config")
        .arg(config.path())
        .args(["--embedding-provider", "word2vec"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported provider: word2vec"));
}
