//! Command and language-context type definitions.
//!
//! This module defines the data model shared by the extractor, the context
//! assigner and the pipeline. The types are designed for serialization with
//! [`serde`]; wire field names are camelCase so results can be handed to a
//! CI configuration generator as-is.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language name carried by synthesized default contexts.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Operational role of an extracted command.
///
/// The set is closed: every command belongs to exactly one category.
/// [`CommandCategory::PRIORITY`] is the order in which pattern tables are
/// consulted during classification.
///
/// # Examples
///
/// ```
/// use doc_commands_core::CommandCategory;
///
/// assert_eq!(CommandCategory::PRIORITY[0], CommandCategory::Install);
/// assert_eq!("test".parse::<CommandCategory>().unwrap(), CommandCategory::Test);
/// assert_eq!(CommandCategory::Build.to_string(), "build");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCategory {
    /// Fetches external dependencies.
    Install,
    /// Compiles or packages the project.
    Build,
    /// Runs the test suite.
    Test,
    /// Anything else (run, lint, serve, deploy).
    Other,
}

impl CommandCategory {
    /// Classification priority, highest first.
    pub const PRIORITY: [CommandCategory; 4] = [
        CommandCategory::Install,
        CommandCategory::Build,
        CommandCategory::Test,
        CommandCategory::Other,
    ];

    /// Returns the lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Build => "build",
            Self::Test => "test",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known [`CommandCategory`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for CommandCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "install" => Ok(Self::Install),
            "build" => Ok(Self::Build),
            "test" => Ok(Self::Test),
            "other" => Ok(Self::Other),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// Inclusive, 1-based line/column range within the source document.
///
/// # Examples
///
/// ```
/// use doc_commands_core::SourceRange;
///
/// let fence = SourceRange::new(3, 1, 6, 3);
/// let line = SourceRange::single_line(4, 1, 11);
/// assert!(fence.contains(&line));
/// assert!(!line.contains(&fence));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRange {
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl SourceRange {
    /// Creates a range; `end_line` is raised to `start_line` if smaller.
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
            start_column,
            end_column,
        }
    }

    /// Creates a range covering part of a single line.
    pub fn single_line(line: usize, start_column: usize, end_column: usize) -> Self {
        Self::new(line, start_column, line, end_column)
    }

    /// Returns `true` when `other` lies entirely within `self`.
    ///
    /// Columns are only compared on the boundary lines.
    pub fn contains(&self, other: &SourceRange) -> bool {
        if other.start_line < self.start_line || other.end_line > self.end_line {
            return false;
        }
        if other.start_line == self.start_line && other.start_column < self.start_column {
            return false;
        }
        if other.end_line == self.end_line && other.end_column > self.end_column {
            return false;
        }
        true
    }

    /// Size key used to prefer the most specific range: line span first,
    /// then column span. An inverted range has extent zero.
    pub fn extent(&self) -> (usize, usize) {
        (
            self.end_line.saturating_sub(self.start_line),
            self.end_column.saturating_sub(self.start_column),
        )
    }
}

/// Provenance of a [`LanguageContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    /// Produced by the language detection stage.
    Detected,
    /// Derived from the caller-supplied parent context.
    Parent,
    /// Synthesized because nothing else applied.
    Default,
}

/// Creation metadata attached to every context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetadata {
    pub created_at: DateTime<Utc>,
    pub source: ContextSource,
}

/// Kind of signal that produced a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvidenceKind {
    /// Code fence info string (```` ```python ````).
    FenceTag,
    /// Section heading naming a language.
    Heading,
    /// Mention of a manifest file such as `package.json`.
    ManifestFile,
    /// Supplied by the caller rather than found in the document.
    Caller,
}

/// One signal contributing to a context. Diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub value: String,
    pub line: usize,
}

impl Evidence {
    pub fn new(kind: EvidenceKind, value: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
        }
    }
}

/// A document region believed to be written in one language.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use doc_commands_core::{ContextSource, LanguageContext, SourceRange};
///
/// let ctx = LanguageContext::detected("Python", 0.9, SourceRange::new(1, 1, 10, 1), Utc::now());
/// assert_eq!(ctx.metadata.source, ContextSource::Detected);
/// assert!(!ctx.is_unknown());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageContext {
    pub language: String,
    pub confidence: f64,
    pub source_range: SourceRange,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    pub metadata: ContextMetadata,
}

impl LanguageContext {
    /// Creates a context produced by detection. Confidence is clamped to [0, 1].
    pub fn detected(
        language: impl Into<String>,
        confidence: f64,
        source_range: SourceRange,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            language: language.into(),
            confidence: clamp_unit(confidence),
            source_range,
            evidence: Vec::new(),
            metadata: ContextMetadata {
                created_at,
                source: ContextSource::Detected,
            },
        }
    }

    /// Appends one evidence entry.
    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }

    /// Returns `true` for synthesized contexts that carry no language.
    pub fn is_unknown(&self) -> bool {
        self.language.eq_ignore_ascii_case(UNKNOWN_LANGUAGE)
    }
}

/// A single extracted instruction.
///
/// Fields are read through accessors. The only way to change a command after
/// extraction is [`Command::with_context`], which returns an assigned copy.
///
/// # Examples
///
/// ```
/// use doc_commands_core::{Command, CommandCategory, SourceRange};
///
/// let cmd = Command::new("cargo build", CommandCategory::Build, 0.9, SourceRange::single_line(5, 1, 11))
///     .with_language("Rust");
/// assert_eq!(cmd.text(), "cargo build");
/// assert_eq!(cmd.language(), Some("Rust"));
/// assert!(cmd.context_confidence().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(rename = "command")]
    text: String,
    category: CommandCategory,
    #[serde(rename = "confidence")]
    match_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ecosystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language_context: Option<Arc<LanguageContext>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    source_location: SourceRange,
}

impl Command {
    /// Creates an unassigned command. `match_confidence` is clamped to [0, 1].
    pub fn new(
        text: impl Into<String>,
        category: CommandCategory,
        match_confidence: f64,
        source_location: SourceRange,
    ) -> Self {
        Self {
            text: text.into().trim().to_string(),
            category,
            match_confidence: clamp_unit(match_confidence),
            language: None,
            ecosystem: None,
            language_context: None,
            context_confidence: None,
            description: None,
            pattern: None,
            source_location,
        }
    }

    /// Sets the self-inferred language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the ecosystem whose table classified this command.
    pub fn with_ecosystem(mut self, ecosystem: impl Into<String>) -> Self {
        self.ecosystem = Some(ecosystem.into());
        self
    }

    /// Sets the description (usually the enclosing section heading).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Records the label of the rule that classified this command.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Returns a copy with the context attached.
    ///
    /// `context_confidence` is clamped to `[0, match_confidence]`. Any
    /// earlier assignment is replaced, never combined.
    pub fn with_context(&self, context: Arc<LanguageContext>, context_confidence: f64) -> Self {
        let mut assigned = self.clone();
        assigned.language_context = Some(context);
        assigned.context_confidence =
            Some(clamp_unit(context_confidence).min(self.match_confidence));
        assigned
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> CommandCategory {
        self.category
    }

    pub fn match_confidence(&self) -> f64 {
        self.match_confidence
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn ecosystem(&self) -> Option<&str> {
        self.ecosystem.as_deref()
    }

    pub fn language_context(&self) -> Option<&LanguageContext> {
        self.language_context.as_deref()
    }

    pub fn context_confidence(&self) -> Option<f64> {
        self.context_confidence
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn source_location(&self) -> &SourceRange {
        &self.source_location
    }

    /// Self-inferred language, falling back to the assigned context's
    /// language unless that context is the synthesized unknown one.
    pub fn effective_language(&self) -> Option<&str> {
        self.language.as_deref().or_else(|| {
            self.language_context
                .as_deref()
                .filter(|ctx| !ctx.is_unknown())
                .map(|ctx| ctx.language.as_str())
        })
    }

    /// Final confidence: the assigned confidence, or the match confidence
    /// before assignment.
    pub fn confidence(&self) -> f64 {
        self.context_confidence.unwrap_or(self.match_confidence)
    }
}

/// Counters and warnings collected while extracting one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    pub total_commands: usize,
    pub code_blocks_scanned: usize,
    pub candidate_lines: usize,
    pub skipped_blocks: usize,
    pub duplicates_skipped: usize,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

/// Commands grouped by category, each list in document order.
///
/// # Examples
///
/// ```
/// use doc_commands_core::{Command, CommandCategory, CommandInfo, SourceRange};
///
/// let mut info = CommandInfo::default();
/// info.push(Command::new("npm test", CommandCategory::Test, 0.9, SourceRange::single_line(8, 1, 8)));
/// info.push(Command::new("npm install", CommandCategory::Install, 0.95, SourceRange::single_line(3, 1, 11)));
///
/// assert_eq!(info.texts(CommandCategory::Install), vec!["npm install"]);
/// assert_eq!(info.len(), 2);
/// assert_eq!(info.in_document_order()[0].text(), "npm install");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandInfo {
    pub install: Vec<Command>,
    pub build: Vec<Command>,
    pub test: Vec<Command>,
    pub other: Vec<Command>,
    pub extraction_metadata: ExtractionMetadata,
}

impl CommandInfo {
    /// Appends a command to the list for its category.
    pub fn push(&mut self, command: Command) {
        self.list_mut(command.category()).push(command);
    }

    /// Returns the commands in one category.
    pub fn get(&self, category: CommandCategory) -> &[Command] {
        match category {
            CommandCategory::Install => &self.install,
            CommandCategory::Build => &self.build,
            CommandCategory::Test => &self.test,
            CommandCategory::Other => &self.other,
        }
    }

    fn list_mut(&mut self, category: CommandCategory) -> &mut Vec<Command> {
        match category {
            CommandCategory::Install => &mut self.install,
            CommandCategory::Build => &mut self.build,
            CommandCategory::Test => &mut self.test,
            CommandCategory::Other => &mut self.other,
        }
    }

    /// Iterates over every command, category by category in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        CommandCategory::PRIORITY
            .into_iter()
            .flat_map(move |category| self.get(category).iter())
    }

    /// All commands sorted by source position.
    pub fn in_document_order(&self) -> Vec<&Command> {
        let mut all: Vec<&Command> = self.iter().collect();
        all.sort_by_key(|cmd| {
            let loc = cmd.source_location();
            (loc.start_line, loc.start_column)
        });
        all
    }

    /// Command texts for one category.
    pub fn texts(&self, category: CommandCategory) -> Vec<&str> {
        self.get(category).iter().map(Command::text).collect()
    }

    /// Returns `true` if `text` is listed under `category`.
    pub fn contains(&self, category: CommandCategory, text: &str) -> bool {
        self.get(category).iter().any(|cmd| cmd.text() == text)
    }

    pub fn len(&self) -> usize {
        self.install.len() + self.build.len() + self.test.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces every command with `f(command)`, keeping the grouping and the
    /// metadata. Categories of the replacements must not change.
    pub fn map_commands<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Command) -> Command,
    {
        Self {
            install: self.install.iter().map(&mut f).collect(),
            build: self.build.iter().map(&mut f).collect(),
            test: self.test.iter().map(&mut f).collect(),
            other: self.other.iter().map(&mut f).collect(),
            extraction_metadata: self.extraction_metadata.clone(),
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
