//! Error types for document analysis.
//!
//! Each concern has its own enum. The pipeline converts these into
//! serializable [`Issue`](doc_commands_core::Issue) records so that a caller
//! always receives them alongside whatever partial data was produced.

use std::time::Duration;

use thiserror::Error;

/// The document could not be turned into a block tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input contains a NUL byte, so it is not a text document.
    #[error("document contains a NUL byte at offset {offset}")]
    NulByte { offset: usize },
    /// Input exceeds the configured size limit.
    #[error("document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Command extraction failures that abort the command stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The classification table could not be built or evaluated.
    #[error("pattern evaluation fault: {0}")]
    PatternEvaluation(String),
}

/// Errors raised by analyzers, built-in or caller-supplied.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The analyzer gave up on this document.
    #[error("{0}")]
    Failed(String),

    /// The analyzer's output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The analyzer panicked; the payload message is preserved.
    #[error("analyzer panicked: {0}")]
    Panicked(String),

    /// The analyzer completed after the pipeline deadline.
    #[error("exceeded pipeline deadline after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is outside its allowed range or names something unknown.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
