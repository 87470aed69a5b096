//! Language context assignment.
//!
//! Every command gets exactly one [`LanguageContext`]:
//!
//! 1. the most specific detected context whose range contains the command,
//! 2. otherwise a decayed copy of the caller's parent context,
//! 3. otherwise a synthesized `unknown` context with a fixed low confidence.
//!
//! The final confidence is always recomputed from the command's match
//! confidence, so assigning an already-assigned list gives the same result.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use doc_commands_core::{
    Command, ContextMetadata, ContextSource, LanguageContext, SourceRange, UNKNOWN_LANGUAGE,
};
use tracing::debug;

use crate::confidence::{Agreement, combine};

/// Multiplier applied to a parent context's confidence.
pub const PARENT_DECAY: f64 = 0.8;

/// Confidence of the synthesized `unknown` context.
pub const DEFAULT_CONTEXT_CONFIDENCE: f64 = 0.1;

/// Attaches contexts to commands.
///
/// The clock value is fixed at construction and stamped on every context the
/// assigner synthesizes, so repeated runs over the same input agree.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssigner {
    created_at: DateTime<Utc>,
}

impl Default for ContextAssigner {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl ContextAssigner {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self { created_at }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns an assigned copy of every command, in input order.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{DateTime, Utc};
    /// use doc_commands_analyzer::context::ContextAssigner;
    /// use doc_commands_core::{Command, CommandCategory, LanguageContext, SourceRange};
    ///
    /// let js = LanguageContext::detected("JavaScript", 0.9, SourceRange::new(1, 1, 10, 80), DateTime::<Utc>::UNIX_EPOCH);
    /// let cmd = Command::new("npm install express", CommandCategory::Install, 0.95, SourceRange::single_line(4, 1, 19))
    ///     .with_language("JavaScript");
    ///
    /// let assigner = ContextAssigner::new(DateTime::<Utc>::UNIX_EPOCH);
    /// let out = assigner.assign_default_context(&[cmd], &[js], None);
    /// assert_eq!(out[0].language_context().unwrap().language, "JavaScript");
    /// assert!(out[0].context_confidence().unwrap() <= 0.95);
    /// ```
    pub fn assign_default_context(
        &self,
        commands: &[Command],
        contexts: &[LanguageContext],
        parent: Option<&LanguageContext>,
    ) -> Vec<Command> {
        let shared: Vec<Arc<LanguageContext>> = contexts.iter().cloned().map(Arc::new).collect();
        let parent = parent.map(|ctx| Arc::new(self.derive_parent(ctx)));

        let mut from_detected = 0usize;
        let mut from_parent = 0usize;
        let mut from_default = 0usize;

        let assigned = commands
            .iter()
            .map(|command| {
                let chosen = match most_specific(&shared, command.source_location()) {
                    Some(ctx) => {
                        from_detected += 1;
                        Arc::clone(ctx)
                    }
                    None => match &parent {
                        Some(ctx) => {
                            from_parent += 1;
                            Arc::clone(ctx)
                        }
                        None => {
                            from_default += 1;
                            Arc::new(self.default_context(*command.source_location()))
                        }
                    },
                };
                let agreement = Agreement::between(command, &chosen);
                let confidence = combine(command.match_confidence(), chosen.confidence, agreement);
                command.with_context(chosen, confidence)
            })
            .collect();

        debug!(
            commands = commands.len(),
            detected = from_detected,
            parent = from_parent,
            default = from_default,
            "Assigned language contexts"
        );
        assigned
    }

    fn derive_parent(&self, parent: &LanguageContext) -> LanguageContext {
        let mut derived = parent.clone();
        derived.confidence = (parent.confidence * PARENT_DECAY).clamp(0.0, 1.0);
        derived.metadata = ContextMetadata {
            created_at: self.created_at,
            source: ContextSource::Parent,
        };
        derived
    }

    fn default_context(&self, range: SourceRange) -> LanguageContext {
        LanguageContext {
            language: UNKNOWN_LANGUAGE.to_string(),
            confidence: DEFAULT_CONTEXT_CONFIDENCE,
            source_range: range,
            evidence: Vec::new(),
            metadata: ContextMetadata {
                created_at: self.created_at,
                source: ContextSource::Default,
            },
        }
    }
}

/// Smallest containing range; ties go to higher confidence, then earlier
/// start, then language name.
fn most_specific<'a>(
    contexts: &'a [Arc<LanguageContext>],
    location: &SourceRange,
) -> Option<&'a Arc<LanguageContext>> {
    contexts
        .iter()
        .filter(|ctx| ctx.source_range.contains(location))
        .min_by(|a, b| specificity(a, b))
}

fn specificity(a: &LanguageContext, b: &LanguageContext) -> Ordering {
    a.source_range
        .extent()
        .cmp(&b.source_range.extent())
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| {
            (a.source_range.start_line, a.source_range.start_column)
                .cmp(&(b.source_range.start_line, b.source_range.start_column))
        })
        .then_with(|| a.language.cmp(&b.language))
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_commands_core::CommandCategory;

    const EPOCH: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

    fn ctx(language: &str, confidence: f64, start: usize, end: usize) -> LanguageContext {
        LanguageContext::detected(language, confidence, SourceRange::new(start, 1, end, 200), EPOCH)
    }

    fn npm_install(line: usize) -> Command {
        Command::new("npm install express", CommandCategory::Install, 0.95, SourceRange::single_line(line, 1, 19))
            .with_language("JavaScript")
    }

    fn assigner() -> ContextAssigner {
        ContextAssigner::new(EPOCH)
    }

    #[test]
    fn test_contained_command_takes_detected_context() {
        let out = assigner().assign_default_context(&[npm_install(5)], &[ctx("JavaScript", 0.9, 3, 7)], None);
        let assigned = &out[0];
        assert_eq!(assigned.language_context().unwrap().language, "JavaScript");
        let expected = combine(0.95, 0.9, Agreement::Agree);
        assert_eq!(assigned.context_confidence(), Some(expected));
        assert!(expected >= combine(0.95, 0.9, Agreement::Conflict));
    }

    #[test]
    fn test_smallest_containing_context_wins() {
        let contexts = [ctx("Python", 0.4, 1, 100), ctx("JavaScript", 0.7, 3, 20), ctx("Go", 0.9, 30, 40)];
        let out = assigner().assign_default_context(&[npm_install(5)], &contexts, None);
        assert_eq!(out[0].language_context().unwrap().language, "JavaScript");
    }

    #[test]
    fn test_ties_break_on_confidence_then_name_regardless_of_order() {
        let a = ctx("Ruby", 0.7, 3, 7);
        let b = ctx("JavaScript", 0.9, 3, 7);
        let c = ctx("Elixir", 0.9, 3, 7);

        for contexts in [vec![a.clone(), b.clone(), c.clone()], vec![c.clone(), b.clone(), a.clone()]] {
            let out = assigner().assign_default_context(&[npm_install(5)], &contexts, None);
            assert_eq!(out[0].language_context().unwrap().language, "Elixir");
        }
    }

    #[test]
    fn test_parent_fallback_decays_confidence() {
        let parent = ctx("JavaScript", 0.9, 1, 1);
        let out = assigner().assign_default_context(&[npm_install(50)], &[ctx("Go", 0.9, 1, 10)], Some(&parent));
        let chosen = out[0].language_context().unwrap();
        assert_eq!(chosen.metadata.source, ContextSource::Parent);
        assert!((chosen.confidence - 0.72).abs() < 1e-9);
        assert_eq!(parent.confidence, 0.9);
    }

    #[test]
    fn test_default_fallback_is_unknown_with_fixed_confidence() {
        let out = assigner().assign_default_context(&[npm_install(5)], &[], None);
        let chosen = out[0].language_context().unwrap();
        assert_eq!(chosen.language, UNKNOWN_LANGUAGE);
        assert_eq!(chosen.confidence, DEFAULT_CONTEXT_CONFIDENCE);
        assert_eq!(chosen.metadata.source, ContextSource::Default);
        assert_eq!(chosen.metadata.created_at, EPOCH);
        assert_eq!(chosen.source_range, *out[0].source_location());
        // Self evidence keeps the command above the raw default.
        assert_eq!(out[0].effective_language(), Some("JavaScript"));
        assert!(out[0].context_confidence().unwrap() > DEFAULT_CONTEXT_CONFIDENCE);
    }

    #[test]
    fn test_reassignment_is_idempotent() {
        let contexts = [ctx("Python", 0.9, 1, 3)];
        let commands = [npm_install(2), npm_install(8)];
        let once = assigner().assign_default_context(&commands, &contexts, None);
        let twice = assigner().assign_default_context(&once, &contexts, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reassignment_through_parent_does_not_compound_decay() {
        let parent = ctx("JavaScript", 0.9, 1, 1);
        let commands = [npm_install(2), npm_install(8)];
        let once = assigner().assign_default_context(&commands, &[], Some(&parent));
        let twice = assigner().assign_default_context(&once, &[], Some(&parent));
        assert_eq!(once, twice);
        let chosen = twice[0].language_context().unwrap();
        assert_eq!(chosen.metadata.source, ContextSource::Parent);
        assert!((chosen.confidence - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_context_ranges_do_not_panic() {
        let inverted = |start_line, end_line| SourceRange {
            start_line,
            end_line,
            start_column: 1,
            end_column: 200,
        };
        let mut go = ctx("Go", 0.9, 1, 1);
        go.source_range = inverted(6, 2);
        let mut rust = ctx("Rust", 0.8, 1, 1);
        rust.source_range = inverted(6, 3);
        let contexts = [go, rust];
        let command = Command::new("go build", CommandCategory::Build, 0.9, inverted(7, 1));
        let out = assigner().assign_default_context(&[command], &contexts, None);
        assert_eq!(out[0].language_context().unwrap().language, "Go");
    }

    #[test]
    fn test_conflict_keeps_self_language() {
        let out = assigner().assign_default_context(&[npm_install(2)], &[ctx("Python", 0.9, 1, 3)], None);
        assert_eq!(out[0].language(), Some("JavaScript"));
        assert_eq!(out[0].language_context().unwrap().language, "Python");
        assert_eq!(out[0].context_confidence(), Some(combine(0.95, 0.9, Agreement::Conflict)));
    }

    #[test]
    fn test_commands_share_one_context_instance() {
        let out = assigner().assign_default_context(&[npm_install(2), npm_install(3)], &[ctx("JavaScript", 0.9, 1, 4)], None);
        let first = out[0].language_context().unwrap() as *const LanguageContext;
        let second = out[1].language_context().unwrap() as *const LanguageContext;
        assert_eq!(first, second);
    }
}
