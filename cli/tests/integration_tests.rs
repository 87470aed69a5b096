//! End-to-end tests that run the built `doc-commands` binary.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const README: &str = "\
# widget

A tiny widget.

## Installation

```bash
npm install
```

## Development

```bash
npm run build
npm test
```
";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_doc-commands"))
}

fn write_readme(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("README.md");
    fs::write(&path, text).expect("failed to write README");
    path
}

fn run_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(bin())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn doc-commands");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input)
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for doc-commands")
}

fn parse_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("Invalid JSON output: {e}\n{stdout}"))
}

#[test]
fn test_analyze_file_json_output() {
    let dir = TempDir::new().unwrap();
    let readme = write_readme(&dir, README);

    let output = Command::new(bin())
        .arg("analyze-file")
        .arg("--input")
        .arg(&readme)
        .output()
        .expect("failed to run doc-commands");

    assert!(
        output.status.success(),
        "analyze-file failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let parsed = parse_json(&output);
    assert_eq!(parsed["success"], true);
    let commands = &parsed["data"]["commands"];
    assert_eq!(commands["install"][0]["command"], "npm install");
    assert_eq!(commands["build"][0]["command"], "npm run build");
    assert_eq!(commands["test"][0]["command"], "npm test");
    assert!(parsed["data"]["overallConfidence"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_analyze_file_yaml_output() {
    let dir = TempDir::new().unwrap();
    let readme = write_readme(&dir, README);

    let output = Command::new(bin())
        .args(["analyze-file", "--format", "yaml", "--input"])
        .arg(&readme)
        .output()
        .expect("failed to run doc-commands");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("success: true"));
    assert!(stdout.contains("command: npm install"));
}

#[test]
fn test_analyze_stdin_table_output() {
    let output = run_stdin(&["analyze-stdin", "--format", "table"], README.as_bytes());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Status: OK"));
    assert!(stdout.contains("npm install"));
    assert!(stdout.contains("npm test"));
}

#[test]
fn test_analyze_stdin_markdown_output() {
    let output = run_stdin(&["analyze-stdin", "--format", "markdown"], README.as_bytes());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# widget"));
    assert!(stdout.contains("## Install commands"));
}

#[test]
fn test_binary_input_exits_nonzero() {
    let output = run_stdin(&["analyze-stdin"], b"# title\0garbage");
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let parsed = parse_json(&output);
    assert_eq!(parsed["success"], false);
    assert_eq!(parsed["errors"][0]["kind"], "parseFailure");
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn test_missing_input_file_exits_nonzero() {
    let output = Command::new(bin())
        .args(["analyze-file", "--input", "/nonexistent/README.md"])
        .output()
        .expect("failed to run doc-commands");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}

#[test]
fn test_warnings_do_not_change_exit_code() {
    let output = run_stdin(&["analyze-stdin"], b"```sh\nmake test\n```\n\n```sh\nmake\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning:"));
    assert!(stderr.contains("malformed_block"));
}

#[test]
fn test_config_file_and_language_override() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("settings.yaml");
    fs::write(&config, "stages: [commands]\nparent_language: Python\nparent_confidence: 0.9\n").unwrap();

    let output = run_stdin(
        &["analyze-stdin", "--config", config.to_str().unwrap(), "--language", "Go"],
        b"```sh\nmake test\n```\n",
    );
    assert!(output.status.success());
    let parsed = parse_json(&output);
    let data = &parsed["data"];
    assert!(data.get("metadata").is_none());
    let context = &data["commands"]["test"][0]["languageContext"];
    assert_eq!(context["language"], "Go");
    assert_eq!(context["metadata"]["source"], "parent");
}

#[test]
fn test_invalid_config_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("settings.yaml");
    fs::write(&config, "parent_confidence: 3.0\n").unwrap();

    let output = run_stdin(&["analyze-stdin", "--config", config.to_str().unwrap()], README.as_bytes());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load config"));
}

#[test]
fn test_patterns_lists_ecosystem_rules() {
    let output = Command::new(bin())
        .args(["patterns", "--ecosystem", "cargo"])
        .output()
        .expect("failed to run doc-commands");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("cargo (Rust)"));
    assert!(stdout.contains("cargo-build"));
    assert!(!stdout.contains("npm-install"));
}

#[test]
fn test_patterns_rejects_unknown_ecosystem() {
    let output = Command::new(bin())
        .args(["patterns", "--ecosystem", "fortran"])
        .output()
        .expect("failed to run doc-commands");
    assert_eq!(output.status.code(), Some(1));
}
