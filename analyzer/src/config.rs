//! Pipeline configuration.
//!
//! Settings are plain data, serializable to YAML, and passed explicitly to
//! [`Pipeline::new`](crate::pipeline::Pipeline::new). Every field has a
//! default, so an empty file is a valid configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! stages: [metadata, languages, env_vars, commands, dependencies]
//! weights:
//!   commands: 2.0
//!   metadata: 0.5
//! timeout_ms: 2000
//! max_document_bytes: 1048576
//! parent_language: Python
//! parent_confidence: 0.6
//! extra_patterns:
//!   - ecosystem: npm
//!     category: test
//!     pattern: '^npm\s+run\s+e2e\b'
//!     confidence: 0.85
//!     label: npm-e2e
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use doc_commands_core::{CommandCategory, Evidence, EvidenceKind, LanguageContext, SourceRange};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ExtractionError};
use crate::extractor::{Ecosystem, PatternRule, PatternTable};
use crate::markdown::DEFAULT_MAX_DOCUMENT_BYTES;
use crate::pipeline::BuiltinStage;

/// Current configuration format version.
pub const CONFIG_VERSION: &str = "1.0";

/// Confidence given to a caller-supplied parent language when none is set.
pub const DEFAULT_PARENT_CONFIDENCE: f64 = 0.5;

/// An additional classification rule supplied by configuration.
///
/// Extra rules run after the built-in rules of the same ecosystem and
/// category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPattern {
    /// Ecosystem name as accepted by [`Ecosystem`]'s `FromStr`.
    pub ecosystem: String,
    pub category: CommandCategory,
    /// Regular expression matched against the command.
    pub pattern: String,
    /// Optional guard; commands matching it are not claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ExtraPattern {
    fn to_rule(&self) -> Result<(Ecosystem, PatternRule), ExtractionError> {
        let ecosystem: Ecosystem = self.ecosystem.parse()?;
        let label = self
            .label
            .clone()
            .unwrap_or_else(|| format!("config-{}-{}", ecosystem, self.category));
        let mut rule = PatternRule::new(self.category, &self.pattern, self.confidence, label)?;
        if let Some(guard) = &self.exclude {
            rule = rule.excluding(guard)?;
        }
        Ok((ecosystem, rule))
    }
}

/// Settings for one [`Pipeline`](crate::pipeline::Pipeline).
///
/// # Examples
///
/// ```
/// use doc_commands_analyzer::config::PipelineSettings;
/// use doc_commands_analyzer::pipeline::BuiltinStage;
///
/// let settings = PipelineSettings::from_yaml_str("weights:\n  commands: 3.0\n").unwrap();
/// assert_eq!(settings.weight(BuiltinStage::Commands), 3.0);
/// assert_eq!(settings.weight(BuiltinStage::Metadata), 1.0);
/// assert!(settings.is_enabled(BuiltinStage::Dependencies));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Configuration format version.
    pub version: String,
    /// Built-in stages to run. Stages not listed are absent from the result.
    pub stages: Vec<BuiltinStage>,
    /// Aggregation weight per stage; unlisted stages weigh 1.0.
    pub weights: BTreeMap<BuiltinStage, f64>,
    /// Pipeline deadline in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Documents larger than this fail to parse.
    pub max_document_bytes: usize,
    /// Language of the enclosing project, used when nothing in the document
    /// covers a command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_language: Option<String>,
    /// Confidence of `parent_language`, before decay.
    pub parent_confidence: f64,
    /// Classification rules appended to the built-in table.
    pub extra_patterns: Vec<ExtraPattern>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            stages: BuiltinStage::ALL.to_vec(),
            weights: BTreeMap::new(),
            timeout_ms: None,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            parent_language: None,
            parent_confidence: DEFAULT_PARENT_CONFIDENCE,
            extra_patterns: Vec::new(),
        }
    }
}

impl PipelineSettings {
    /// Loads and validates settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if parsing fails, or [`ConfigError::Invalid`]
    /// if a value is out of range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let settings: Self = serde_yaml::from_reader(reader)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses and validates settings from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Saves the settings as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// Pattern syntax is not checked here; a broken pattern is reported by
    /// the command stage when the table is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (stage, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "weight for stage '{stage}' must be a non-negative number, got {weight}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.parent_confidence) {
            return Err(ConfigError::Invalid(format!(
                "parent_confidence must be in [0, 1], got {}",
                self.parent_confidence
            )));
        }
        if self.max_document_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_document_bytes must be greater than zero".to_string(),
            ));
        }
        for extra in &self.extra_patterns {
            if !(0.0..=1.0).contains(&extra.confidence) {
                return Err(ConfigError::Invalid(format!(
                    "extra pattern '{}' confidence must be in [0, 1], got {}",
                    extra.pattern, extra.confidence
                )));
            }
            if extra.ecosystem.parse::<Ecosystem>().is_err() {
                return Err(ConfigError::Invalid(format!(
                    "extra pattern '{}' names unknown ecosystem '{}'",
                    extra.pattern, extra.ecosystem
                )));
            }
        }
        Ok(())
    }

    pub fn is_enabled(&self, stage: BuiltinStage) -> bool {
        self.stages.contains(&stage)
    }

    /// Aggregation weight of `stage`.
    pub fn weight(&self, stage: BuiltinStage) -> f64 {
        self.weights.get(&stage).copied().unwrap_or(1.0)
    }

    /// The built-in table extended with `extra_patterns`.
    pub fn pattern_table(&self) -> Result<PatternTable, ExtractionError> {
        let mut table = PatternTable::builtin().clone();
        for extra in &self.extra_patterns {
            let (ecosystem, rule) = extra.to_rule()?;
            table.add_rule(ecosystem, rule)?;
        }
        Ok(table)
    }

    /// Parent context described by `parent_language`, if set.
    pub fn parent_context(&self, created_at: DateTime<Utc>) -> Option<LanguageContext> {
        let language = self.parent_language.as_deref()?.trim();
        if language.is_empty() {
            return None;
        }
        Some(
            LanguageContext::detected(
                language,
                self.parent_confidence,
                SourceRange::single_line(1, 1, 1),
                created_at,
            )
            .with_evidence(Evidence::new(EvidenceKind::Caller, language, 0)),
        )
    }
}
