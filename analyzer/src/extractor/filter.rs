//! Candidate-line filter.
//!
//! Decides whether a normalized segment of a code fence "looks like a
//! command" before it reaches the pattern tables.

use super::patterns::{PatternTable, looks_like_executable_path};

/// Build tools that are commands even with no arguments.
const BARE_BUILD_TOOLS: &[&str] = &["make", "cmake", "ant", "sbt", "lein", "mix"];

/// A segment split into the tool token and the text the rules see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// First word after prefixes, e.g. `cargo` or `./gradlew`.
    pub tool: &'a str,
    /// Segment with `sudo` and leading `NAME=value` assignments removed.
    pub body: &'a str,
}

/// Strips `sudo` and leading environment assignments from `text`.
///
/// ```
/// use doc_commands_analyzer::extractor::split_invocation;
///
/// let inv = split_invocation("sudo RUST_LOG=debug cargo test");
/// assert_eq!(inv.tool, "cargo");
/// assert_eq!(inv.body, "cargo test");
/// ```
pub fn split_invocation(text: &str) -> Invocation<'_> {
    let mut rest = text.trim();
    loop {
        let (first, tail) = match rest.split_once(char::is_whitespace) {
            Some((first, tail)) => (first, tail.trim_start()),
            None => (rest, ""),
        };
        if tail.is_empty() {
            break;
        }
        if first == "sudo" || is_assignment(first) {
            rest = tail;
        } else {
            break;
        }
    }
    let tool = rest.split_whitespace().next().unwrap_or("");
    Invocation { tool, body: rest }
}

/// Returns `true` for `NAME=value` tokens with an upper-case shell name.
fn is_assignment(token: &str) -> bool {
    let Some((key, _)) = token.split_once('=') else {
        return false;
    };
    !key.is_empty()
        && !key.starts_with(|ch: char| ch.is_ascii_digit())
        && key
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_')
}

/// `export X=1` or a row made only of assignments.
pub fn is_env_var_row(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.starts_with("export ") || trimmed.starts_with("set ") {
        return true;
    }
    let mut tokens = trimmed.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(is_assignment)
}

/// Shell or batch comment line.
pub fn is_comment_row(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with("::")
        || trimmed
            .get(..4)
            .is_some_and(|head| head.eq_ignore_ascii_case("rem "))
        || trimmed.eq_ignore_ascii_case("rem")
}

/// Returns `true` when `segment` should be classified as a command.
pub fn is_candidate(segment: &str, table: &PatternTable) -> bool {
    let trimmed = segment.trim();
    if trimmed.is_empty() || is_comment_row(trimmed) || is_env_var_row(trimmed) {
        return false;
    }

    let invocation = split_invocation(trimmed);
    let tool = invocation.tool;
    if tool.is_empty() || tool == "cd" || tool == "pushd" || tool == "popd" {
        return false;
    }

    if BARE_BUILD_TOOLS.contains(&tool) {
        return true;
    }
    if table.known_tools().any(|known| known == tool) {
        return true;
    }
    looks_like_executable_path(tool) || runs_shell_script(invocation.body)
}

fn runs_shell_script(body: &str) -> bool {
    let mut words = body.split_whitespace();
    matches!(words.next(), Some("sh" | "bash" | "zsh"))
        && words.next().is_some_and(|arg| arg.ends_with(".sh"))
}
