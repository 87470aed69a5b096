//! README command extraction and language attribution.
//!
//! This crate reads a project's README (or any markdown document) and
//! extracts the shell commands it documents, grouped as install, build,
//! test, and other. Each command is attributed to a programming language
//! from the code fence tag, the enclosing section, or the manifests the
//! document mentions, and carries a confidence that combines how well the
//! command matched a known pattern with how sure the language attribution is.
//!
//! # Main entry points
//!
//! - [`analyze_readme`]: run every built-in stage with default settings.
//! - [`pipeline::Pipeline`]: configurable pipeline with stage selection,
//!   weights, a deadline, a caller-supplied parent context, and custom
//!   [`pipeline::Analyzer`]s.
//! - [`extractor::CommandExtractor`]: command extraction only, without
//!   language contexts.
//!
//! # Example
//!
//! ```
//! use doc_commands_analyzer::analyze_readme;
//! use doc_commands_core::CommandCategory;
//!
//! let readme = "# widget\n\n## Installation\n\n```bash\nnpm install\n```\n\n## Testing\n\n```bash\nnpm test\n```\n";
//!
//! let result = analyze_readme(readme);
//! assert!(result.success);
//! let commands = result.commands().unwrap();
//! assert_eq!(commands.texts(CommandCategory::Install), vec!["npm install"]);
//! assert!(commands.contains(CommandCategory::Test, "npm test"));
//! ```
//!
//! # Crate type
//!
//! This is a **library-only crate**. For command-line usage, use the
//! `doc-commands-cli` crate which provides the `doc-commands` binary.

pub mod confidence;
pub mod config;
pub mod context;
pub mod dependencies;
pub mod detect;
pub mod env_vars;
pub mod error;
pub mod extractor;
pub mod markdown;
pub mod metadata;
pub mod output;
pub mod pipeline;

pub use config::PipelineSettings;
pub use error::{AnalyzerError, ConfigError, ExtractionError, ParseError};
pub use output::{OutputFormat, format_result};
pub use pipeline::{Analyzer, AnalyzerOutput, Pipeline, PipelineConfig};

use doc_commands_core::AnalysisResult;

/// Analyzes `text` with the default pipeline configuration.
pub fn analyze_readme(text: &str) -> AnalysisResult {
    Pipeline::new(PipelineConfig::default()).execute(text)
}
