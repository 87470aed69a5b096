//! Custom analyzer example.
//!
//! Registers a caller-defined [`Analyzer`] that collects badge links, runs it
//! next to the built-in stages, and shows that a failing analyzer is recorded
//! without affecting anything else.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p doc-commands-demos --example custom_analyzer
//! ```

use std::sync::Arc;

use doc_commands_analyzer::error::AnalyzerError;
use doc_commands_analyzer::markdown::Document;
use doc_commands_analyzer::pipeline::{Analyzer, AnalyzerOutput, Pipeline, PipelineConfig};
use doc_commands_analyzer::PipelineSettings;
use serde_json::json;

/// Collects shields.io badge URLs.
struct Badges;

impl Analyzer for Badges {
    fn name(&self) -> &str {
        "badges"
    }

    fn analyze(&self, _document: &Document, raw_text: &str) -> Result<AnalyzerOutput, AnalyzerError> {
        let badges: Vec<&str> = raw_text
            .split(['(', ')'])
            .filter(|part| part.starts_with("https://img.shields.io/"))
            .collect();
        let confidence = if badges.is_empty() { 0.0 } else { 1.0 };
        Ok(AnalyzerOutput::new(json!({ "badges": badges }), confidence).with_source("raw text"))
    }
}

/// Always gives up.
struct Changelog;

impl Analyzer for Changelog {
    fn name(&self) -> &str {
        "changelog"
    }

    fn analyze(&self, document: &Document, _raw_text: &str) -> Result<AnalyzerOutput, AnalyzerError> {
        document
            .headings()
            .find(|(_, _, title)| title.eq_ignore_ascii_case("changelog"))
            .map(|(block, _, _)| AnalyzerOutput::new(json!({ "line": block.range.start_line }), 0.9))
            .ok_or_else(|| AnalyzerError::Failed("no changelog section".to_string()))
    }
}

fn main() {
    let readme = r#"# gizmo

[![crates.io](https://img.shields.io/crates/v/gizmo.svg)](https://crates.io/crates/gizmo)
[![docs](https://img.shields.io/docsrs/gizmo)](https://docs.rs/gizmo)

A gizmo for Rust projects.

## Building

```sh
cargo build --release
cargo test --all-features
```
"#;

    let settings = PipelineSettings {
        parent_language: Some("Rust".to_string()),
        ..Default::default()
    };
    let config = PipelineConfig::new(settings)
        .with_analyzer(Arc::new(Badges))
        .with_analyzer(Arc::new(Changelog));

    let result = Pipeline::new(config).execute(readme);
    let Some(data) = &result.data else {
        eprintln!("analysis failed: {:?}", result.errors);
        std::process::exit(1);
    };

    for (name, output) in &data.custom {
        println!("{name} ({:.2}): {}", output.confidence, output.data);
    }
    for issue in &result.errors {
        println!("recorded: {issue}");
    }

    if let Some(commands) = &data.commands {
        for cmd in commands.in_document_order() {
            println!("{:<8} {}", cmd.category(), cmd.text());
        }
    }
}
