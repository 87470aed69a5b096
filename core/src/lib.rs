//! Core types and invariant validation for README command extraction.
//!
//! This crate defines the data model shared by the analyzer and its
//! consumers:
//!
//! - [`Command`]: one extracted CLI invocation with category, inferred
//!   language, and confidence.
//! - [`LanguageContext`]: a document region believed to be written in one
//!   language, with provenance.
//! - [`CommandInfo`]: commands grouped by [`CommandCategory`] plus
//!   extraction counters.
//! - [`AnalysisResult`]: the pipeline-level result with per-stage outputs,
//!   errors, and warnings.
//!
//! Validation ([`validate_command_info`], [`validate_context`]) checks the
//! invariants the extractor and the context assigner must uphold.
//!
//! # Example
//!
//! ```
//! use doc_commands_core::*;
//!
//! let mut info = CommandInfo::default();
//! info.push(
//!     Command::new("go install", CommandCategory::Build, 0.9, SourceRange::single_line(7, 1, 10))
//!         .with_language("Go"),
//! );
//!
//! assert_eq!(info.texts(CommandCategory::Build), vec!["go install"]);
//! assert!(info.get(CommandCategory::Install).is_empty());
//! assert!(validate_command_info(&info).is_empty());
//! ```

mod analysis;
mod types;
mod validate;

pub use analysis::*;
pub use types::*;
pub use validate::{ValidationError, validate_command, validate_command_info, validate_context};
