//! Environment variables a README asks the reader to set.
//!
//! Code fences contribute `export NAME=value` and `NAME=value` rows; prose
//! contributes backticked upper-case names that contain an underscore
//! (`` `DATABASE_URL` ``). The first sighting of a name wins.

use std::collections::HashSet;
use std::sync::LazyLock;

use doc_commands_core::EnvVarInfo;
use regex::Regex;

use crate::extractor::strip_prompt;
use crate::markdown::Document;

/// Confidence when at least one variable was assigned in a code fence.
pub const FENCE_ENV_CONFIDENCE: f64 = 0.8;

/// Confidence when variables were only mentioned in prose.
pub const PROSE_ENV_CONFIDENCE: f64 = 0.5;

static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:export\s+|set\s+)?([A-Z][A-Z0-9_]*)=("[^"]*"|'[^']*'|\S*)"#)
        .expect("static regex must compile")
});

static PROSE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([A-Z][A-Z0-9]*_[A-Z0-9_]*)(?:=([^`]*))?`").expect("static regex must compile")
});

/// Extracts variables in document order with the stage confidence.
///
/// ```
/// use doc_commands_analyzer::{env_vars::extract_env_vars, markdown};
///
/// let text = "Set `API_TOKEN` first.\n\n```sh\nexport PORT=8080\n```\n";
/// let doc = markdown::parse(text).unwrap();
/// let (vars, confidence) = extract_env_vars(&doc, text);
/// let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
/// assert_eq!(names, ["API_TOKEN", "PORT"]);
/// assert_eq!(vars[1].default_value.as_deref(), Some("8080"));
/// assert_eq!(confidence, 0.8);
/// ```
pub fn extract_env_vars(document: &Document, raw_text: &str) -> (Vec<EnvVarInfo>, f64) {
    let fence_ranges: Vec<(usize, usize)> = document
        .code_fences()
        .map(|(block, _)| (block.range.start_line, block.range.end_line))
        .collect();

    let mut seen = HashSet::new();
    let mut vars = Vec::new();
    let mut from_fence = false;

    for (offset, line) in raw_text.lines().enumerate() {
        let number = offset + 1;
        // Fence marker lines never match an assignment, so whole ranges are fine.
        let in_fence = fence_ranges
            .iter()
            .any(|&(start, end)| (start..=end).contains(&number));

        if in_fence {
            let row = strip_prompt(line.trim());
            if let Some(caps) = ASSIGNMENT_RE.captures(row) {
                let name = caps[1].to_string();
                let value = unquote(caps.get(2).map_or("", |m| m.as_str()));
                if seen.insert(name.clone()) {
                    from_fence = true;
                    vars.push(EnvVarInfo {
                        name,
                        default_value: (!value.is_empty()).then(|| value.to_string()),
                        line: number,
                    });
                }
            }
        } else {
            for caps in PROSE_NAME_RE.captures_iter(line) {
                let name = caps[1].to_string();
                if seen.insert(name.clone()) {
                    vars.push(EnvVarInfo {
                        name,
                        default_value: caps
                            .get(2)
                            .map(|m| unquote(m.as_str()).to_string())
                            .filter(|value| !value.is_empty()),
                        line: number,
                    });
                }
            }
        }
    }

    let confidence = if from_fence {
        FENCE_ENV_CONFIDENCE
    } else if vars.is_empty() {
        0.0
    } else {
        PROSE_ENV_CONFIDENCE
    };
    (vars, confidence)
}

fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown;

    fn env(text: &str) -> (Vec<EnvVarInfo>, f64) {
        let doc = markdown::parse(text).unwrap();
        extract_env_vars(&doc, text)
    }

    #[test]
    fn test_fence_assignments_with_quotes_and_prefix_runs() {
        let text = "```bash\nexport DATABASE_URL=\"postgres://localhost/app\"\nRUST_LOG=debug cargo run\nexport EMPTY=\n```\n";
        let (vars, confidence) = env(text);
        assert_eq!(vars.len(), 3);
        assert_eq!(vars[0].default_value.as_deref(), Some("postgres://localhost/app"));
        assert_eq!(vars[0].line, 2);
        assert_eq!(vars[1].name, "RUST_LOG");
        assert_eq!(vars[2].default_value, None);
        assert_eq!(confidence, FENCE_ENV_CONFIDENCE);
    }

    #[test]
    fn test_prose_only_mentions() {
        let text = "Configure `SECRET_KEY` and `LOG_LEVEL=info`.\nNot `PATH` or `lower_case`.\n";
        let (vars, confidence) = env(text);
        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["SECRET_KEY", "LOG_LEVEL"]);
        assert_eq!(vars[1].default_value.as_deref(), Some("info"));
        assert_eq!(confidence, PROSE_ENV_CONFIDENCE);
    }

    #[test]
    fn test_first_sighting_wins() {
        let text = "Use `APP_PORT`.\n\n```sh\nAPP_PORT=3000\n```\n";
        let (vars, confidence) = env(text);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].line, 1);
        assert_eq!(vars[0].default_value, None);
        assert_eq!(confidence, PROSE_ENV_CONFIDENCE);
    }

    #[test]
    fn test_no_vars_means_zero_confidence() {
        assert_eq!(env("# Title\n\n```sh\nmake\n```\n"), (Vec::new(), 0.0));
    }
}
