//! Analyzer pipeline.
//!
//! Runs every stage over one document and merges the outputs:
//!
//! ```text
//! parse ─┬─ metadata ───────────────────────────────┐
//!        ├─ languages ── commands ── dependencies ──┼─ aggregate
//!        ├─ env_vars ───────────────────────────────┤
//!        └─ custom analyzers (after built-ins) ─────┘
//! ```
//!
//! Parse failure is the only fatal outcome. Any other stage may fail, panic
//! or run past the deadline; its output is then `None`, the failure is
//! recorded as an [`Issue`], and the remaining stages still run. The overall
//! confidence is a weighted mean over the built-in stages that succeeded.
//!
//! # Example
//!
//! ```
//! use doc_commands_analyzer::pipeline::{Pipeline, PipelineConfig};
//!
//! let readme = "# app\n\n## Installation\n\n```bash\nnpm install\n```\n";
//! let result = Pipeline::new(PipelineConfig::default()).execute(readme);
//! assert!(result.success);
//! let commands = result.commands().unwrap();
//! assert_eq!(commands.install[0].text(), "npm install");
//! ```

mod analyzer;
mod stage;

pub use analyzer::{Analyzer, AnalyzerOutput};
pub use stage::{BuiltinStage, PARSE_STAGE, StageError, StageRun, panic_message, past_deadline, run_stage};

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use doc_commands_core::{
    AnalysisData, AnalysisResult, CommandInfo, CustomAnalysis, Issue, IssueKind, LanguageContext,
    StageReport, StageStatus, validate_command_info,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::PipelineSettings;
use crate::context::ContextAssigner;
use crate::dependencies::extract_dependencies;
use crate::detect::LanguageDetector;
use crate::env_vars::extract_env_vars;
use crate::error::{AnalyzerError, ExtractionError};
use crate::extractor::CommandExtractor;
use crate::markdown::{self, Document};
use crate::metadata::extract_metadata;

/// Everything a [`Pipeline`] needs, passed explicitly.
#[derive(Clone, Default)]
pub struct PipelineConfig {
    pub settings: PipelineSettings,
    /// Run after the built-in stages; output lands in `data.custom`.
    pub custom_analyzers: Vec<Arc<dyn Analyzer>>,
    /// Context for commands no detected context covers. Takes precedence
    /// over `settings.parent_language`.
    pub parent_context: Option<LanguageContext>,
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.custom_analyzers.iter().map(|a| a.name()).collect();
        f.debug_struct("PipelineConfig")
            .field("settings", &self.settings)
            .field("custom_analyzers", &names)
            .field("parent_context", &self.parent_context)
            .finish()
    }
}

impl PipelineConfig {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.custom_analyzers.push(analyzer);
        self
    }

    pub fn with_parent_context(mut self, context: LanguageContext) -> Self {
        self.parent_context = Some(context);
        self
    }
}

/// Runs the analysis stages over documents.
///
/// Holds no per-document state; one pipeline may analyze any number of
/// documents, sequentially or from several threads.
pub struct Pipeline {
    config: PipelineConfig,
    /// Built once; a bad configured rule fails only the command stage.
    extractor: Result<CommandExtractor, ExtractionError>,
    created_at: DateTime<Utc>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let extractor = config
            .settings
            .pattern_table()
            .and_then(CommandExtractor::new);
        if let Err(err) = &extractor {
            warn!(error = %err, "Pattern table is invalid; command extraction will fail");
        }
        Self {
            config,
            extractor,
            created_at: Utc::now(),
        }
    }

    /// Fixes the timestamp stamped on contexts this pipeline creates.
    pub fn with_clock(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyzes one document.
    pub fn execute(&self, text: &str) -> AnalysisResult {
        let started = Instant::now();
        let settings = &self.config.settings;
        let deadline = settings
            .timeout_ms
            .map(|ms| started + Duration::from_millis(ms));
        info!(
            bytes = text.len(),
            custom_analyzers = self.config.custom_analyzers.len(),
            "Starting document analysis"
        );

        let document = match markdown::parse_with_limit(text, settings.max_document_bytes) {
            Ok(document) => document,
            Err(err) => {
                warn!(error = %err, "Document could not be parsed");
                return AnalysisResult::fatal(Issue::new(
                    PARSE_STAGE,
                    IssueKind::ParseFailure,
                    err.to_string(),
                ));
            }
        };
        if past_deadline(deadline) {
            warn!("Parsing finished after the pipeline deadline");
            return AnalysisResult::fatal(Issue::new(
                PARSE_STAGE,
                IssueKind::StageTimeout,
                "parsing finished after the pipeline deadline",
            ));
        }

        let mut merge = Merge::new(settings);
        merge.reports.push(StageReport {
            stage: PARSE_STAGE.to_string(),
            status: StageStatus::Ok,
            confidence: None,
            elapsed_ms: millis(started.elapsed()),
        });

        let doc = &document;
        let detector = LanguageDetector::new(self.created_at);
        let (metadata, (languages, env_vars)) = rayon::join(
            || {
                self.enabled(BuiltinStage::Metadata)
                    .then(|| run_stage(deadline, || Ok(extract_metadata(doc, text))))
            },
            || {
                rayon::join(
                    || {
                        self.enabled(BuiltinStage::Languages).then(|| {
                            run_stage(deadline, || {
                                let contexts = detector.detect(doc, text);
                                let confidence = contexts
                                    .iter()
                                    .map(|ctx| ctx.confidence)
                                    .fold(0.0, f64::max);
                                Ok((contexts, confidence))
                            })
                        })
                    },
                    || {
                        self.enabled(BuiltinStage::EnvVars)
                            .then(|| run_stage(deadline, || Ok(extract_env_vars(doc, text))))
                    },
                )
            },
        );

        let contexts = self.command_contexts(&languages, &mut merge);

        let parent = self
            .config
            .parent_context
            .clone()
            .or_else(|| settings.parent_context(self.created_at));
        let commands = self.enabled(BuiltinStage::Commands).then(|| {
            run_stage(deadline, || {
                self.extract_commands(doc, text, contexts, parent.as_ref())
            })
        });

        let dependencies = if !self.enabled(BuiltinStage::Dependencies) {
            None
        } else {
            match &commands {
                Some(StageRun::Done { value, .. }) => {
                    Some(run_stage(deadline, || Ok(extract_dependencies(value))))
                }
                Some(_) => {
                    merge.skip(BuiltinStage::Dependencies, "command extraction did not complete");
                    None
                }
                None => {
                    merge.skip(BuiltinStage::Dependencies, "command extraction is disabled");
                    None
                }
            }
        };

        let custom = self.run_custom_analyzers(doc, text, deadline);

        let metadata = merge.record(BuiltinStage::Metadata, metadata);
        let languages = merge.record(BuiltinStage::Languages, languages);
        let env_vars = merge.record(BuiltinStage::EnvVars, env_vars);
        let commands = merge.record(BuiltinStage::Commands, commands);
        let dependencies = merge.record(BuiltinStage::Dependencies, dependencies);

        if let Some(info) = &commands {
            merge.command_issues(info);
        }
        let custom = merge.custom(custom);

        let overall_confidence = merge.overall_confidence();
        info!(
            elapsed_ms = millis(started.elapsed()),
            overall_confidence,
            errors = merge.errors.len(),
            warnings = merge.warnings.len(),
            "Finished document analysis"
        );

        AnalysisResult {
            success: true,
            data: Some(AnalysisData {
                commands,
                languages,
                metadata,
                dependencies,
                env_vars,
                custom,
                stage_confidences: merge.confidences,
                stages: merge.reports,
                overall_confidence,
            }),
            errors: merge.errors,
            warnings: merge.warnings,
        }
    }

    fn enabled(&self, stage: BuiltinStage) -> bool {
        self.config.settings.is_enabled(stage)
    }

    /// Contexts handed to command extraction. Without a successful language
    /// stage commands fall back to the parent or default context.
    fn command_contexts<'r>(
        &self,
        languages: &'r Option<StageRun<Vec<LanguageContext>>>,
        merge: &mut Merge<'_>,
    ) -> &'r [LanguageContext] {
        match languages {
            Some(StageRun::Done { value, .. }) => value.as_slice(),
            Some(_) if self.enabled(BuiltinStage::Commands) => {
                merge.warn(
                    BuiltinStage::Commands,
                    IssueKind::Skipped,
                    "language contexts unavailable; commands use parent or default contexts",
                );
                &[]
            }
            _ => &[],
        }
    }

    fn extract_commands(
        &self,
        document: &Document,
        text: &str,
        contexts: &[LanguageContext],
        parent: Option<&LanguageContext>,
    ) -> Result<(CommandInfo, f64), StageError> {
        let fault = |err: ExtractionError| StageError::new(IssueKind::PatternEvaluationFault, err.to_string());
        let extractor = self.extractor.as_ref().map_err(|err| fault(err.clone()))?;
        let extracted = extractor.extract(document, text).map_err(fault)?;

        let assigner = ContextAssigner::new(self.created_at);
        let assign = |commands: &[doc_commands_core::Command]| {
            assigner.assign_default_context(commands, contexts, parent)
        };
        let assigned = CommandInfo {
            install: assign(&extracted.install),
            build: assign(&extracted.build),
            test: assign(&extracted.test),
            other: assign(&extracted.other),
            extraction_metadata: extracted.extraction_metadata,
        };

        let count = assigned.len();
        let confidence = if count == 0 {
            0.0
        } else {
            assigned.iter().map(|cmd| cmd.confidence()).sum::<f64>() / count as f64
        };
        Ok((assigned, confidence))
    }

    fn run_custom_analyzers(
        &self,
        document: &Document,
        text: &str,
        deadline: Option<Instant>,
    ) -> Vec<(String, Result<AnalyzerOutput, AnalyzerError>)> {
        self.config
            .custom_analyzers
            .par_iter()
            .map(|analyzer| {
                let name = analyzer.name().to_string();
                debug!(analyzer = %name, "Running custom analyzer");
                (name, run_analyzer(analyzer.as_ref(), document, text, deadline))
            })
            .collect()
    }
}

fn run_analyzer(
    analyzer: &dyn Analyzer,
    document: &Document,
    text: &str,
    deadline: Option<Instant>,
) -> Result<AnalyzerOutput, AnalyzerError> {
    if past_deadline(deadline) {
        return Err(AnalyzerError::Timeout {
            elapsed: Duration::ZERO,
        });
    }
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(document, text)));
    if past_deadline(deadline) {
        return Err(AnalyzerError::Timeout {
            elapsed: started.elapsed(),
        });
    }
    outcome.unwrap_or_else(|payload| Err(AnalyzerError::Panicked(panic_message(payload.as_ref()))))
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Accumulates stage outcomes into the result.
struct Merge<'a> {
    settings: &'a PipelineSettings,
    reports: Vec<StageReport>,
    errors: Vec<Issue>,
    warnings: Vec<Issue>,
    confidences: BTreeMap<String, f64>,
    weighted_sum: f64,
    total_weight: f64,
}

impl<'a> Merge<'a> {
    fn new(settings: &'a PipelineSettings) -> Self {
        Self {
            settings,
            reports: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            confidences: BTreeMap::new(),
            weighted_sum: 0.0,
            total_weight: 0.0,
        }
    }

    fn warn(&mut self, stage: BuiltinStage, kind: IssueKind, message: impl Into<String>) {
        let issue = Issue::new(stage.as_str(), kind, message);
        warn!(stage = %stage, kind = %kind, message = %issue.message, "Stage warning");
        self.warnings.push(issue);
    }

    fn skip(&mut self, stage: BuiltinStage, reason: &str) {
        self.warn(stage, IssueKind::Skipped, format!("{stage} skipped: {reason}"));
        self.reports.push(StageReport {
            stage: stage.as_str().to_string(),
            status: StageStatus::Skipped,
            confidence: None,
            elapsed_ms: 0,
        });
    }

    /// Records one stage and returns its output if it succeeded.
    fn record<T>(&mut self, stage: BuiltinStage, run: Option<StageRun<T>>) -> Option<T> {
        let run = run?;
        let elapsed_ms = millis(run.elapsed());
        let name = stage.as_str().to_string();

        match run {
            StageRun::Done {
                value, confidence, ..
            } => {
                let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
                debug!(stage = %stage, confidence, elapsed_ms, "Stage completed");
                let weight = self.settings.weight(stage);
                if weight > 0.0 {
                    self.weighted_sum += weight * confidence;
                    self.total_weight += weight;
                }
                self.confidences.insert(name.clone(), confidence);
                self.reports.push(StageReport {
                    stage: name,
                    status: StageStatus::Ok,
                    confidence: Some(confidence),
                    elapsed_ms,
                });
                Some(value)
            }
            StageRun::Failed { error, .. } => {
                warn!(stage = %stage, kind = %error.kind, error = %error.message, "Stage failed");
                self.errors.push(Issue::new(name.clone(), error.kind, error.message));
                self.reports.push(StageReport {
                    stage: name,
                    status: StageStatus::Failed,
                    confidence: None,
                    elapsed_ms,
                });
                None
            }
            StageRun::TimedOut { elapsed } => {
                let message = if elapsed.is_zero() {
                    format!("{stage} did not start before the pipeline deadline")
                } else {
                    format!("{stage} finished after the pipeline deadline ({elapsed_ms} ms)")
                };
                warn!(stage = %stage, elapsed_ms, "Stage timed out");
                self.errors.push(Issue::new(name.clone(), IssueKind::StageTimeout, message));
                self.reports.push(StageReport {
                    stage: name,
                    status: StageStatus::TimedOut,
                    confidence: None,
                    elapsed_ms,
                });
                None
            }
        }
    }

    /// Surfaces extractor warnings and invariant checks for the command stage.
    fn command_issues(&mut self, info: &CommandInfo) {
        for message in &info.extraction_metadata.warnings {
            self.warnings.push(Issue::new(
                BuiltinStage::Commands.as_str(),
                IssueKind::MalformedBlock,
                message.clone(),
            ));
        }
        for violation in validate_command_info(info) {
            self.errors.push(Issue::new(
                BuiltinStage::Commands.as_str(),
                IssueKind::InvariantViolation,
                violation.to_string(),
            ));
        }
    }

    fn custom(
        &mut self,
        outputs: Vec<(String, Result<AnalyzerOutput, AnalyzerError>)>,
    ) -> BTreeMap<String, CustomAnalysis> {
        let mut custom = BTreeMap::new();
        for (name, outcome) in outputs {
            match outcome {
                Ok(_) if custom.contains_key(&name) => {
                    self.errors.push(Issue::new(
                        name.clone(),
                        IssueKind::PluginFailure,
                        format!("duplicate analyzer name '{name}'; later output dropped"),
                    ));
                }
                Ok(output) => {
                    custom.insert(name, CustomAnalysis::from(output));
                }
                Err(err) => {
                    warn!(analyzer = %name, error = %err, "Custom analyzer failed");
                    self.errors.push(Issue::new(name, IssueKind::PluginFailure, err.to_string()));
                }
            }
        }
        custom
    }

    fn overall_confidence(&self) -> f64 {
        if self.total_weight > 0.0 {
            (self.weighted_sum / self.total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_commands_core::{CommandCategory, ContextSource, UNKNOWN_LANGUAGE};

    fn pipeline(settings: PipelineSettings) -> Pipeline {
        Pipeline::new(PipelineConfig::new(settings)).with_clock(DateTime::<Utc>::UNIX_EPOCH)
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let result = pipeline(PipelineSettings::default()).execute("# a\0b");
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, IssueKind::ParseFailure);
        assert_eq!(result.errors[0].stage, PARSE_STAGE);
    }

    #[test]
    fn test_oversized_document_is_fatal() {
        let settings = PipelineSettings {
            max_document_bytes: 8,
            ..Default::default()
        };
        let result = pipeline(settings).execute("# a long title\n");
        assert!(!result.success);
        assert_eq!(result.errors[0].kind, IssueKind::ParseFailure);
    }

    #[test]
    fn test_zero_timeout_fails_at_parse() {
        let settings = PipelineSettings {
            timeout_ms: Some(0),
            ..Default::default()
        };
        let result = pipeline(settings).execute("# a\n");
        assert!(!result.success);
        assert_eq!(result.errors[0].kind, IssueKind::StageTimeout);
    }

    #[test]
    fn test_disabled_stage_is_absent_without_issue() {
        let settings = PipelineSettings {
            stages: vec![BuiltinStage::Commands, BuiltinStage::Dependencies],
            ..Default::default()
        };
        let result = pipeline(settings).execute("```sh\npip install flask\n```\n");
        let data = result.data.unwrap();
        assert!(data.metadata.is_none());
        assert!(data.languages.is_none());
        assert!(data.env_vars.is_none());
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(data.dependencies.unwrap().packages[0].name, "flask");
        assert!(!data.stages.iter().any(|r| r.stage == "metadata"));
    }

    #[test]
    fn test_dependencies_skipped_when_commands_disabled() {
        let settings = PipelineSettings {
            stages: vec![BuiltinStage::Dependencies],
            ..Default::default()
        };
        let result = pipeline(settings).execute("```sh\nnpm install\n```\n");
        let data = result.data.unwrap();
        assert!(data.dependencies.is_none());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, IssueKind::Skipped);
        assert_eq!(data.overall_confidence, 0.0);
    }

    #[test]
    fn test_invalid_extra_pattern_fails_only_commands() {
        let yaml = "extra_patterns:\n  - ecosystem: npm\n    category: build\n    pattern: '^npm ('\n    confidence: 0.7\n";
        let settings = PipelineSettings::from_yaml_str(yaml).unwrap();
        let result = pipeline(settings).execute("# demo\n\nA demo.\n\n```sh\nnpm test\n```\n");

        assert!(result.success);
        let data = result.data.as_ref().unwrap();
        assert!(data.commands.is_none());
        assert!(data.metadata.is_some());
        assert!(data.languages.is_some());
        let kinds: Vec<_> = result.errors.iter().map(|e| (e.stage.as_str(), e.kind)).collect();
        assert!(kinds.contains(&("commands", IssueKind::PatternEvaluationFault)));
        assert!(result.warnings.iter().any(|w| w.stage == "dependencies" && w.kind == IssueKind::Skipped));
    }

    #[test]
    fn test_unterminated_fence_becomes_malformed_block_warning() {
        let result = pipeline(PipelineSettings::default()).execute("```sh\nmake test\n```\n\n```sh\nmake\n");
        assert!(result.success);
        assert!(result.warnings.iter().any(|w| w.kind == IssueKind::MalformedBlock));
        let commands = result.commands().unwrap();
        assert!(commands.contains(CommandCategory::Test, "make test"));
        assert!(!commands.contains(CommandCategory::Build, "make"));
    }

    #[test]
    fn test_development_section_commands_are_categorized() {
        let text = "# Project\n\n## Installation\n\n```bash\nnpm install\n```\n\n## Development\n\n```bash\nnpm run dev\nnpm test\n```\n";
        let result = pipeline(PipelineSettings::default()).execute(text);
        assert!(result.success);
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);

        let commands = result.commands().unwrap();
        assert_eq!(commands.texts(CommandCategory::Install), vec!["npm install"]);
        assert!(commands.contains(CommandCategory::Test, "npm test"));
        for text in ["npm install", "npm test"] {
            assert!(!commands.contains(CommandCategory::Build, text), "{text}");
            assert!(!commands.contains(CommandCategory::Other, text), "{text}");
        }
        assert!(commands.contains(CommandCategory::Other, "npm run dev"));
        assert_eq!(commands.test[0].description(), Some("Development"));
    }

    #[test]
    fn test_commands_fall_back_when_language_stage_times_out() {
        let settings = PipelineSettings {
            parent_language: Some("Go".to_string()),
            ..Default::default()
        };
        let p = pipeline(settings);
        let text = "## Setup\n\n```sh\ngo build ./...\nmake test\n```\n";
        let doc = markdown::parse(text).unwrap();

        let languages = Some(StageRun::TimedOut {
            elapsed: Duration::from_millis(5),
        });
        let mut merge = Merge::new(&p.config.settings);
        let contexts = p.command_contexts(&languages, &mut merge);
        assert!(contexts.is_empty());
        assert_eq!(merge.warnings.len(), 1);
        assert_eq!(merge.warnings[0].stage, "commands");
        assert_eq!(merge.warnings[0].kind, IssueKind::Skipped);

        let parent = p.config.settings.parent_context(p.created_at);
        let (info, confidence) = p.extract_commands(&doc, text, contexts, parent.as_ref()).unwrap();
        assert_eq!(info.len(), 2);
        assert!(confidence > 0.0);
        for cmd in info.iter() {
            let ctx = cmd.language_context().unwrap();
            assert_eq!(ctx.metadata.source, ContextSource::Parent);
            assert_eq!(ctx.language, "Go");
        }
    }

    #[test]
    fn test_commands_use_default_context_when_language_stage_fails() {
        let p = pipeline(PipelineSettings::default());
        let text = "```sh\nmake test\n```\n";
        let doc = markdown::parse(text).unwrap();

        let languages = Some(StageRun::Failed {
            error: StageError::new(IssueKind::StageFailure, "detector unavailable"),
            elapsed: Duration::ZERO,
        });
        let mut merge = Merge::new(&p.config.settings);
        let contexts = p.command_contexts(&languages, &mut merge);
        let (info, _) = p.extract_commands(&doc, text, contexts, None).unwrap();

        let ctx = info.test[0].language_context().unwrap();
        assert_eq!(ctx.language, UNKNOWN_LANGUAGE);
        assert_eq!(ctx.metadata.source, ContextSource::Default);
        assert_eq!(merge.warnings.len(), 1);
    }

    #[test]
    fn test_no_context_warning_when_commands_disabled() {
        let settings = PipelineSettings {
            stages: vec![BuiltinStage::Languages],
            ..Default::default()
        };
        let p = pipeline(settings);
        let languages: Option<StageRun<Vec<LanguageContext>>> = Some(StageRun::TimedOut {
            elapsed: Duration::ZERO,
        });
        let mut merge = Merge::new(&p.config.settings);
        assert!(p.command_contexts(&languages, &mut merge).is_empty());
        assert!(merge.warnings.is_empty());
    }
}
