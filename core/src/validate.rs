//! Invariant validation for extracted commands and contexts.
//!
//! Checks the properties every [`CommandInfo`] must hold: each command sits
//! in the list for its own category, no command text is listed under two
//! categories, confidences are in [0, 1], and an assigned context never
//! raises confidence above the pattern match.
//!
//! # Examples
//!
//! ```
//! use doc_commands_core::*;
//!
//! let mut info = CommandInfo::default();
//! info.push(Command::new("cargo test", CommandCategory::Test, 0.9, SourceRange::single_line(4, 1, 10)));
//! assert!(validate_command_info(&info).is_empty());
//!
//! // The same text filed under a second category is rejected.
//! info.other.push(Command::new("cargo test", CommandCategory::Other, 0.4, SourceRange::single_line(9, 1, 10)));
//! assert!(!validate_command_info(&info).is_empty());
//! ```

use std::collections::HashMap;

use thiserror::Error;

use crate::{Command, CommandCategory, CommandInfo, LanguageContext};

/// Model invariant violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Command text is empty after trimming.
    #[error("command text cannot be empty")]
    EmptyCommand,
    /// A command is stored in a list other than its category's.
    #[error("command '{command}' has category {category} but is listed under {listed}")]
    MisfiledCommand {
        command: String,
        category: CommandCategory,
        listed: CommandCategory,
    },
    /// The same command text appears under two categories.
    #[error("command '{command}' appears under both {first} and {second}")]
    DuplicateAcrossCategories {
        command: String,
        first: CommandCategory,
        second: CommandCategory,
    },
    /// A confidence value lies outside [0, 1].
    #[error("{field} of '{subject}' out of range: {value}")]
    ConfidenceOutOfRange {
        subject: String,
        field: &'static str,
        value: f64,
    },
    /// contextConfidence is greater than matchConfidence.
    #[error("context confidence {context} exceeds match confidence {matched} for '{command}'")]
    ContextExceedsMatch {
        command: String,
        context: f64,
        matched: f64,
    },
    /// A context range ends before it starts.
    #[error("invalid source range for {0} context")]
    InvalidSourceRange(String),
}

/// Validates every command in `info`.
pub fn validate_command_info(info: &CommandInfo) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<&str, CommandCategory> = HashMap::new();

    for listed in CommandCategory::PRIORITY {
        for command in info.get(listed) {
            if command.category() != listed {
                errors.push(ValidationError::MisfiledCommand {
                    command: command.text().to_string(),
                    category: command.category(),
                    listed,
                });
            }

            match seen.get(command.text()) {
                Some(&first) if first != listed => {
                    errors.push(ValidationError::DuplicateAcrossCategories {
                        command: command.text().to_string(),
                        first,
                        second: listed,
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(command.text(), listed);
                }
            }

            errors.extend(validate_command(command));
        }
    }

    errors
}

/// Validates a single command.
pub fn validate_command(command: &Command) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if command.text().is_empty() {
        errors.push(ValidationError::EmptyCommand);
        return errors;
    }

    let matched = command.match_confidence();
    if !is_unit(matched) {
        errors.push(ValidationError::ConfidenceOutOfRange {
            subject: command.text().to_string(),
            field: "matchConfidence",
            value: matched,
        });
    }

    if let Some(context) = command.context_confidence() {
        if !is_unit(context) {
            errors.push(ValidationError::ConfidenceOutOfRange {
                subject: command.text().to_string(),
                field: "contextConfidence",
                value: context,
            });
        } else if context > matched {
            errors.push(ValidationError::ContextExceedsMatch {
                command: command.text().to_string(),
                context,
                matched,
            });
        }
    }

    if let Some(ctx) = command.language_context() {
        errors.extend(validate_context(ctx));
    }

    errors
}

/// Validates a language context's confidence and range.
pub fn validate_context(context: &LanguageContext) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if !is_unit(context.confidence) {
        errors.push(ValidationError::ConfidenceOutOfRange {
            subject: context.language.clone(),
            field: "confidence",
            value: context.confidence,
        });
    }
    if context.source_range.start_line > context.source_range.end_line {
        errors.push(ValidationError::InvalidSourceRange(context.language.clone()));
    }
    errors
}

fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
