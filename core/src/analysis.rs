//! Pipeline-level result types.
//!
//! An [`AnalysisResult`] is produced once per document and owned by the
//! caller. Stage outputs that are missing because the stage failed, timed
//! out or was disabled are `None` rather than empty placeholders.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{CommandInfo, LanguageContext};

/// Project facts pulled from the README.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default)]
    pub sections: Vec<String>,
}

/// A package named by an install command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub ecosystem: String,
    pub source_command: String,
}

/// Dependencies declared through install commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    pub packages: Vec<Dependency>,
    #[serde(default)]
    pub requirement_files: Vec<String>,
}

/// An environment variable the README asks the user to set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub line: usize,
}

/// Output of a caller-registered analyzer, kept apart from core confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAnalysis {
    pub data: serde_json::Value,
    pub confidence: f64,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Classification of a recorded error or warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    /// The document could not be turned into an AST. Fatal.
    ParseFailure,
    /// A code block was skipped.
    MalformedBlock,
    /// The classification table could not be evaluated.
    PatternEvaluationFault,
    /// A stage finished (or would start) after the pipeline deadline.
    StageTimeout,
    /// A built-in stage returned an error.
    StageFailure,
    /// A custom analyzer failed or panicked.
    PluginFailure,
    /// A stage did not run because its input was unavailable.
    Skipped,
    /// Extracted data broke a model invariant.
    InvariantViolation,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ParseFailure => "parse_failure",
            Self::MalformedBlock => "malformed_block",
            Self::PatternEvaluationFault => "pattern_evaluation_fault",
            Self::StageTimeout => "stage_timeout",
            Self::StageFailure => "stage_failure",
            Self::PluginFailure => "plugin_failure",
            Self::Skipped => "skipped",
            Self::InvariantViolation => "invariant_violation",
        };
        f.write_str(label)
    }
}

/// One error or warning, attributed to the stage that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub stage: String,
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(stage: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.kind, self.message)
    }
}

/// Completion state of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageStatus {
    Ok,
    Failed,
    TimedOut,
    Skipped,
}

/// Per-stage execution summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: String,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub elapsed_ms: u64,
}

/// Aggregated stage outputs for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<CommandInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<LanguageContext>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProjectMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<EnvVarInfo>>,
    #[serde(default)]
    pub custom: BTreeMap<String, CustomAnalysis>,
    /// Confidence of each successful built-in stage.
    #[serde(default)]
    pub stage_confidences: BTreeMap<String, f64>,
    #[serde(default)]
    pub stages: Vec<StageReport>,
    pub overall_confidence: f64,
}

/// Result of one pipeline invocation.
///
/// # Examples
///
/// ```
/// use doc_commands_core::{AnalysisResult, Issue, IssueKind};
///
/// let result = AnalysisResult::fatal(Issue::new("parse", IssueKind::ParseFailure, "NUL byte at offset 4"));
/// assert!(!result.success);
/// assert!(result.data.is_none());
/// assert_eq!(result.errors.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalysisData>,
    #[serde(default)]
    pub errors: Vec<Issue>,
    #[serde(default)]
    pub warnings: Vec<Issue>,
}

impl AnalysisResult {
    /// A failed result carrying a single fatal error and no data.
    pub fn fatal(error: Issue) -> Self {
        Self {
            success: false,
            data: None,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    /// Extracted commands, if the command stage completed.
    pub fn commands(&self) -> Option<&CommandInfo> {
        self.data.as_ref().and_then(|data| data.commands.as_ref())
    }

    /// Overall confidence, or 0 for fatal results.
    pub fn overall_confidence(&self) -> f64 {
        self.data.as_ref().map_or(0.0, |data| data.overall_confidence)
    }
}
