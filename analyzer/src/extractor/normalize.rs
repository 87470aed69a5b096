//! Code-fence line normalization.
//!
//! Turns raw fence content into logical command lines: continuation lines are
//! joined, shell prompts and trailing comments are removed, and chained
//! invocations are split into segments.

use std::sync::LazyLock;

use regex::Regex;

use crate::markdown::CodeFence;

/// One logical line assembled from one or more physical fence lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
    /// 1-based column of the first non-blank character on `start_line`.
    pub start_column: usize,
    /// Length of the last physical line, in characters.
    pub end_column: usize,
}

static PROMPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\$|>|%|#\s*\$|PS[^>]*>|C:\\[^>]*>)\s+").expect("static regex must compile")
});

// `>` alone is left out: npm and yarn echo lifecycle scripts with it.
static SHELL_PROMPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\$|%|#\s*\$|PS[^>]*>|C:\\[^>]*>)\s+").expect("static regex must compile")
});

// `> name@1.0.0 postinstall`, `> @scope/name@1.0.0 build`
static SCRIPT_ECHO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^>\s+@?[\w.-]+(?:/[\w.-]+)?@\S+\s+\S+").expect("static regex must compile")
});

/// Joins `\`-continued lines of `fence` into logical lines.
///
/// `source_lines` is the raw document; when available it is used so that
/// columns refer to the original text rather than the de-indented content.
pub fn logical_lines(fence: &CodeFence, source_lines: &[&str]) -> Vec<LogicalLine> {
    let mut out = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (number, line) in fence.numbered_lines() {
        let raw = source_lines.get(number - 1).copied().unwrap_or(line);
        let trimmed = line.trim();
        let continues = trimmed.ends_with('\\');
        let piece = trimmed.trim_end_matches('\\').trim_end();

        match pending.as_mut() {
            Some(current) => {
                if !piece.is_empty() {
                    current.text.push(' ');
                    current.text.push_str(piece);
                }
                current.end_line = number;
                current.end_column = raw.chars().count().max(1);
            }
            None => {
                let leading = raw.chars().take_while(|ch| ch.is_whitespace()).count();
                pending = Some(LogicalLine {
                    text: piece.to_string(),
                    start_line: number,
                    end_line: number,
                    start_column: leading + 1,
                    end_column: raw.chars().count().max(1),
                });
            }
        }

        if !continues {
            if let Some(done) = pending.take() {
                out.push(done);
            }
        }
    }

    if let Some(done) = pending.take() {
        out.push(done);
    }
    out
}

/// Removes one leading shell prompt (`$ `, `> `, `PS C:\> `).
pub fn strip_prompt(text: &str) -> &str {
    match PROMPT_RE.find(text) {
        Some(found) => &text[found.end()..],
        None => text,
    }
}

/// Returns `true` when `text` starts with a prompt that marks a transcript
/// (`$ `, `% `, `PS C:\> `, `C:\> `).
pub fn has_shell_prompt(text: &str) -> bool {
    SHELL_PROMPT_RE.is_match(text)
}

/// Returns `true` for the `> name@version script` header a package manager
/// prints before running a lifecycle script.
pub fn is_script_echo(text: &str) -> bool {
    SCRIPT_ECHO_RE.is_match(text)
}

/// Removes a trailing ` # comment` that is not inside quotes.
pub fn strip_trailing_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_is_space = true;
    for (idx, ch) in text.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == '#' && prev_is_space && idx > 0 => return text[..idx].trim_end(),
            None => {}
        }
        prev_is_space = ch.is_whitespace();
    }
    text
}

/// Splits `a && b || c; d` into `[a, b, c, d]`, ignoring separators inside
/// quotes. Empty segments are dropped.
pub fn split_segments(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let byte = bytes[idx];
        match quote {
            Some(open) => {
                if byte == open {
                    quote = None;
                }
                idx += 1;
            }
            None => {
                let pair = bytes.get(idx..idx + 2);
                if byte == b'\'' || byte == b'"' {
                    quote = Some(byte);
                    idx += 1;
                } else if matches!(pair, Some(b"&&" | b"||")) {
                    segments.push(&text[start..idx]);
                    idx += 2;
                    start = idx;
                } else if byte == b';' {
                    segments.push(&text[start..idx]);
                    idx += 1;
                    start = idx;
                } else {
                    idx += 1;
                }
            }
        }
    }
    segments.push(&text[start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fence(content: &str, start: usize) -> CodeFence {
        CodeFence {
            language: Some("bash".to_string()),
            info: "bash".to_string(),
            content: content.to_string(),
            content_start_line: start,
            indent: 0,
            closed: true,
        }
    }

    #[test]
    fn test_logical_lines_join_continuations() {
        let f = fence("docker build \\\n  -t app \\\n  .\nnpm test", 10);
        let lines = logical_lines(&f, &[]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "docker build -t app .");
        assert_eq!((lines[0].start_line, lines[0].end_line), (10, 12));
        assert_eq!(lines[1].text, "npm test");
        assert_eq!(lines[1].start_line, 13);
    }

    #[test]
    fn test_logical_lines_use_source_columns() {
        let f = fence("npm ci", 2);
        let source = ["```", "   npm ci", "```"];
        let lines = logical_lines(&f, &source);
        assert_eq!(lines[0].start_column, 4);
        assert_eq!(lines[0].end_column, 9);
    }

    #[test]
    fn test_strip_prompt_variants() {
        assert_eq!(strip_prompt("$ npm install"), "npm install");
        assert_eq!(strip_prompt("> yarn"), "yarn");
        assert_eq!(strip_prompt("PS C:\\src> dotnet build"), "dotnet build");
        assert_eq!(strip_prompt("cargo build"), "cargo build");
    }

    #[test]
    fn test_angle_prompt_is_not_a_transcript_marker() {
        assert!(has_shell_prompt("$ npm install"));
        assert!(has_shell_prompt("PS C:\\src> dotnet build"));
        assert!(!has_shell_prompt("> yarn"));
        assert!(!has_shell_prompt("npm install"));
    }

    #[test]
    fn test_script_echo_headers() {
        assert!(is_script_echo("> widget@1.0.0 postinstall"));
        assert!(is_script_echo("> @acme/widget@2.3.1 build /home/ci/widget"));
        assert!(!is_script_echo("> node scripts/setup.js"));
        assert!(!is_script_echo("> yarn"));
    }

    #[test]
    fn test_strip_trailing_comment_respects_quotes() {
        assert_eq!(strip_trailing_comment("make test # runs unit tests"), "make test");
        assert_eq!(
            strip_trailing_comment("echo \"a # b\" && make"),
            "echo \"a # b\" && make"
        );
        assert_eq!(strip_trailing_comment("cargo build --features a#b"), "cargo build --features a#b");
    }

    #[test]
    fn test_split_segments_handles_chains_and_quotes() {
        assert_eq!(
            split_segments("cd app && npm install; npm test"),
            vec!["cd app", "npm install", "npm test"]
        );
        assert_eq!(
            split_segments("sh -c 'make && make test'"),
            vec!["sh -c 'make && make test'"]
        );
        assert_eq!(split_segments("  ;; "), Vec::<&str>::new());
    }
}
