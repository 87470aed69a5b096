//! Caller-supplied analyzers.

use doc_commands_core::CustomAnalysis;
use serde::Serialize;

use crate::error::AnalyzerError;
use crate::markdown::Document;

/// Result of one custom analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerOutput {
    pub data: serde_json::Value,
    pub confidence: f64,
    /// Where the data came from (section names, line hints, ...).
    pub sources: Vec<String>,
}

impl AnalyzerOutput {
    pub fn new(data: serde_json::Value, confidence: f64) -> Self {
        Self {
            data,
            confidence,
            sources: Vec::new(),
        }
    }

    /// Serializes `value` as the output data.
    pub fn from_serialize<T: Serialize>(value: &T, confidence: f64) -> Result<Self, AnalyzerError> {
        Ok(Self::new(serde_json::to_value(value)?, confidence))
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }
}

impl From<AnalyzerOutput> for CustomAnalysis {
    fn from(output: AnalyzerOutput) -> Self {
        CustomAnalysis {
            data: output.data,
            confidence: output.confidence.clamp(0.0, 1.0),
            sources: output.sources,
        }
    }
}

/// A pluggable document analyzer.
///
/// Analyzers run concurrently, each over the same read-only document. An
/// error or panic is recorded against the analyzer's name and does not
/// affect any other stage.
///
/// # Examples
///
/// ```
/// use doc_commands_analyzer::error::AnalyzerError;
/// use doc_commands_analyzer::markdown::Document;
/// use doc_commands_analyzer::pipeline::{Analyzer, AnalyzerOutput};
///
/// struct HeadingCount;
///
/// impl Analyzer for HeadingCount {
///     fn name(&self) -> &str {
///         "heading-count"
///     }
///
///     fn analyze(&self, document: &Document, _raw: &str) -> Result<AnalyzerOutput, AnalyzerError> {
///         let count = document.headings().count();
///         Ok(AnalyzerOutput::new(serde_json::json!({ "headings": count }), 1.0))
///     }
/// }
/// ```
pub trait Analyzer: Send + Sync {
    /// Key under which the output is stored in `data.custom`.
    fn name(&self) -> &str;

    fn analyze(&self, document: &Document, raw_text: &str) -> Result<AnalyzerOutput, AnalyzerError>;
}
