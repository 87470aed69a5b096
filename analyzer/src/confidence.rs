//! Combination of pattern-match and language-context confidence.

use doc_commands_core::{Command, LanguageContext};

/// How far agreement lifts the context factor toward 1.0.
pub const AGREEMENT_BOOST: f64 = 0.5;

/// Factor floor when only the command itself names a language.
pub const SELF_EVIDENCE_FLOOR: f64 = 0.5;

/// Factor applied to the context confidence when languages conflict.
pub const CONFLICT_PENALTY: f64 = 0.5;

/// Relation between a command's own language and its context's language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agreement {
    /// Both name the same language.
    Agree,
    /// Only the context names a language.
    ContextOnly,
    /// Only the command names a language; the context is the unknown default.
    CommandOnly,
    /// Both name a language and they differ.
    Conflict,
}

impl Agreement {
    /// Classifies the pair. Language names compare case-insensitively.
    ///
    /// A command without a language under the unknown default context is
    /// `ContextOnly`: nothing but the weak default supports it.
    pub fn between(command: &Command, context: &LanguageContext) -> Self {
        match (command.language(), context.is_unknown()) {
            (Some(_), true) => Agreement::CommandOnly,
            (None, _) => Agreement::ContextOnly,
            (Some(own), false) if own.eq_ignore_ascii_case(&context.language) => Agreement::Agree,
            (Some(_), false) => Agreement::Conflict,
        }
    }

    /// Scales the context confidence `c` into a factor in [0, 1].
    pub fn factor(self, context_confidence: f64) -> f64 {
        let c = unit_or_zero(context_confidence);
        match self {
            Agreement::Agree => c + (1.0 - c) * AGREEMENT_BOOST,
            Agreement::ContextOnly => c,
            Agreement::CommandOnly => c.max(SELF_EVIDENCE_FLOOR),
            Agreement::Conflict => c * CONFLICT_PENALTY,
        }
    }
}

/// Final confidence for a command: `match × factor`, clamped to
/// `[0, match]`. NaN inputs count as 0.
///
/// ```
/// use doc_commands_analyzer::confidence::{Agreement, combine};
///
/// let agree = combine(0.9, 0.8, Agreement::Agree);
/// let conflict = combine(0.9, 0.8, Agreement::Conflict);
/// assert!((agree - 0.81).abs() < 1e-9);
/// assert!((conflict - 0.36).abs() < 1e-9);
/// assert!(combine(0.9, 1.0, Agreement::Agree) <= 0.9);
/// ```
pub fn combine(match_confidence: f64, context_confidence: f64, agreement: Agreement) -> f64 {
    let matched = unit_or_zero(match_confidence);
    (matched * agreement.factor(context_confidence)).clamp(0.0, matched)
}

fn unit_or_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
