//! Custom analyzer isolation: failures, panics, deadlines and weights.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use doc_commands_analyzer::error::AnalyzerError;
use doc_commands_analyzer::markdown::Document;
use doc_commands_analyzer::pipeline::{Analyzer, AnalyzerOutput, BuiltinStage, Pipeline, PipelineConfig};
use doc_commands_analyzer::PipelineSettings;
use doc_commands_core::IssueKind;
use serde_json::json;

const README: &str = "# demo\n\nA demo project.\n\n## Install\n\n```bash\npip install flask==3.0.0\n```\n\n## License\n\nMIT\n";

struct SectionCount;

impl Analyzer for SectionCount {
    fn name(&self) -> &str {
        "section-count"
    }

    fn analyze(&self, document: &Document, _raw: &str) -> Result<AnalyzerOutput, AnalyzerError> {
        let count = document.headings().count();
        Ok(AnalyzerOutput::new(json!({ "sections": count }), 0.8).with_source("headings"))
    }
}

struct Failing;

impl Analyzer for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn analyze(&self, _document: &Document, _raw: &str) -> Result<AnalyzerOutput, AnalyzerError> {
        Err(AnalyzerError::Failed("no badge section".to_string()))
    }
}

struct Panicking;

impl Analyzer for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn analyze(&self, _document: &Document, _raw: &str) -> Result<AnalyzerOutput, AnalyzerError> {
        panic!("analyzer exploded")
    }
}

struct Sleepy(Duration);

impl Analyzer for Sleepy {
    fn name(&self) -> &str {
        "sleepy"
    }

    fn analyze(&self, _document: &Document, _raw: &str) -> Result<AnalyzerOutput, AnalyzerError> {
        thread::sleep(self.0);
        Ok(AnalyzerOutput::new(json!(null), 1.0))
    }
}

fn run(config: PipelineConfig) -> doc_commands_core::AnalysisResult {
    Pipeline::new(config).execute(README)
}

#[test]
fn test_custom_output_is_stored_under_name() {
    let result = run(PipelineConfig::default().with_analyzer(Arc::new(SectionCount)));
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);

    let custom = &result.data.as_ref().unwrap().custom["section-count"];
    assert_eq!(custom.data["sections"], 3);
    assert_eq!(custom.confidence, 0.8);
    assert_eq!(custom.sources, vec!["headings"]);
}

#[test]
fn test_failing_analyzer_does_not_affect_builtins() {
    let baseline = run(PipelineConfig::default());
    let result = run(
        PipelineConfig::default()
            .with_analyzer(Arc::new(Failing))
            .with_analyzer(Arc::new(SectionCount)),
    );

    assert!(result.success);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].stage, "failing");
    assert_eq!(result.errors[0].kind, IssueKind::PluginFailure);
    assert!(result.errors[0].message.contains("no badge section"));

    let data = result.data.as_ref().unwrap();
    let base = baseline.data.as_ref().unwrap();
    let texts = |info: &doc_commands_core::CommandInfo| -> Vec<String> {
        info.iter().map(|c| c.text().to_string()).collect()
    };
    assert_eq!(texts(data.commands.as_ref().unwrap()), texts(base.commands.as_ref().unwrap()));
    assert_eq!(data.dependencies, base.dependencies);
    assert_eq!(data.overall_confidence, base.overall_confidence);
    assert!(data.custom.contains_key("section-count"));
    assert!(!data.custom.contains_key("failing"));
}

#[test]
fn test_panicking_analyzer_is_contained() {
    let result = run(PipelineConfig::default().with_analyzer(Arc::new(Panicking)));
    assert!(result.success);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, IssueKind::PluginFailure);
    assert!(result.errors[0].message.contains("analyzer exploded"));
    assert!(result.commands().is_some());
}

#[test]
fn test_slow_analyzer_times_out() {
    let settings = PipelineSettings {
        timeout_ms: Some(1_000),
        ..Default::default()
    };
    let config = PipelineConfig::new(settings).with_analyzer(Arc::new(Sleepy(Duration::from_millis(1_500))));
    let result = run(config);

    assert!(result.success);
    let timeout = result
        .errors
        .iter()
        .find(|e| e.stage == "sleepy")
        .expect("sleepy analyzer should be reported");
    assert_eq!(timeout.kind, IssueKind::PluginFailure);
    assert!(!result.data.as_ref().unwrap().custom.contains_key("sleepy"));
}

#[test]
fn test_duplicate_analyzer_names_keep_first() {
    let result = run(
        PipelineConfig::default()
            .with_analyzer(Arc::new(SectionCount))
            .with_analyzer(Arc::new(SectionCount)),
    );
    assert_eq!(result.data.as_ref().unwrap().custom.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, IssueKind::PluginFailure);
}

#[test]
fn test_custom_confidence_does_not_enter_overall() {
    let baseline = run(PipelineConfig::default());
    let result = run(PipelineConfig::default().with_analyzer(Arc::new(SectionCount)));
    assert_eq!(
        result.data.unwrap().overall_confidence,
        baseline.data.unwrap().overall_confidence
    );
}

#[test]
fn test_weights_shape_overall_confidence() {
    let mut settings = PipelineSettings::default();
    for stage in BuiltinStage::ALL {
        settings.weights.insert(stage, 0.0);
    }
    settings.weights.insert(BuiltinStage::Dependencies, 1.0);

    let result = run(PipelineConfig::new(settings));
    let data = result.data.unwrap();
    assert_eq!(data.overall_confidence, data.stage_confidences["dependencies"]);
    assert_eq!(data.overall_confidence, 0.9);
}

#[test]
fn test_all_zero_weights_give_zero_overall() {
    let mut settings = PipelineSettings::default();
    for stage in BuiltinStage::ALL {
        settings.weights.insert(stage, 0.0);
    }
    let data = run(PipelineConfig::new(settings)).data.unwrap();
    assert_eq!(data.overall_confidence, 0.0);
    assert_eq!(data.stage_confidences.len(), BuiltinStage::ALL.len());
}
