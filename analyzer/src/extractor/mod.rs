//! Command extraction from parsed markdown.
//!
//! Walks every closed code fence in document order, normalizes its lines,
//! keeps the segments that look like commands and classifies each one with a
//! [`PatternTable`]. Unterminated fences are skipped with a warning. The
//! first occurrence of a command text wins; later repeats are only counted.
//!
//! # Example
//!
//! ```
//! use doc_commands_analyzer::{extractor::CommandExtractor, markdown};
//! use doc_commands_core::CommandCategory;
//!
//! let text = "## Build\n\n```sh\n$ cargo build --release\n```\n";
//! let doc = markdown::parse(text).unwrap();
//! let info = CommandExtractor::builtin().extract(&doc, text).unwrap();
//!
//! let build = &info.build[0];
//! assert_eq!(build.text(), "cargo build --release");
//! assert_eq!(build.language(), Some("Rust"));
//! assert_eq!(build.description(), Some("Build"));
//! assert_eq!(info.extraction_metadata.total_commands, 1);
//! ```

mod filter;
mod normalize;
mod patterns;

use std::collections::HashSet;
use std::time::Instant;

use doc_commands_core::{Command, CommandInfo, ExtractionMetadata, SourceRange};
use tracing::{debug, warn};

pub use filter::{Invocation, is_candidate, is_comment_row, is_env_var_row, split_invocation};
pub use normalize::{
    LogicalLine, has_shell_prompt, is_script_echo, logical_lines, split_segments, strip_prompt,
    strip_trailing_comment,
};
pub use patterns::{
    Classification, Ecosystem, EcosystemPatterns, KEYWORD_INSTALL_CONFIDENCE,
    KEYWORD_OTHER_CONFIDENCE, PatternRule, PatternTable, looks_like_executable_path,
};

use crate::error::ExtractionError;
use crate::markdown::{CodeFence, Document};

/// Fence tags whose content is data, never shell input.
const DATA_FENCE_TAGS: &[&str] = &[
    "json", "jsonc", "yaml", "yml", "toml", "xml", "html", "css", "ini", "csv", "diff", "text",
    "txt", "markdown", "md",
];

/// Extracts and classifies commands.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    table: PatternTable,
}

impl CommandExtractor {
    /// Creates an extractor over `table`, rejecting an invalid table.
    pub fn new(table: PatternTable) -> Result<Self, ExtractionError> {
        table.validate()?;
        Ok(Self { table })
    }

    /// Extractor over the built-in table.
    pub fn builtin() -> Self {
        Self {
            table: PatternTable::builtin().clone(),
        }
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Extracts every command from `document`.
    ///
    /// `raw_text` is the text `document` was parsed from; it is used to
    /// report columns against the original lines.
    pub fn extract(&self, document: &Document, raw_text: &str) -> Result<CommandInfo, ExtractionError> {
        let started = Instant::now();
        let source_lines: Vec<&str> = raw_text.lines().collect();
        let mut info = CommandInfo::default();
        let mut meta = ExtractionMetadata::default();
        let mut seen: HashSet<String> = HashSet::new();

        for (block, fence) in document.code_fences() {
            meta.code_blocks_scanned += 1;

            if !fence.closed {
                meta.skipped_blocks += 1;
                let message = format!(
                    "unterminated code fence at line {} skipped",
                    block.range.start_line
                );
                warn!(line = block.range.start_line, "Skipping unterminated code fence");
                meta.warnings.push(message);
                continue;
            }
            if is_data_fence(fence) {
                debug!(line = block.range.start_line, tag = ?fence.language, "Skipping data fence");
                continue;
            }

            let description = document.heading_before(block.range.start_line);
            for line in command_lines(fence, &source_lines) {
                let location = SourceRange::new(
                    line.start_line,
                    line.start_column,
                    line.end_line,
                    line.end_column,
                );
                for segment in split_segments(&line.text) {
                    if !is_candidate(segment, &self.table) {
                        continue;
                    }
                    meta.candidate_lines += 1;

                    if !seen.insert(segment.to_string()) {
                        meta.duplicates_skipped += 1;
                        continue;
                    }

                    let command = self.classify_segment(segment, location, description);
                    debug!(
                        command = command.text(),
                        category = %command.category(),
                        confidence = command.match_confidence(),
                        line = location.start_line,
                        "Classified command"
                    );
                    info.push(command);
                }
            }
        }

        meta.total_commands = info.len();
        meta.elapsed_ms = started.elapsed().as_millis() as u64;
        info.extraction_metadata = meta;
        Ok(info)
    }

    fn classify_segment(&self, segment: &str, location: SourceRange, description: Option<&str>) -> Command {
        let class = self.table.classify(segment);
        let mut command = Command::new(segment, class.category, class.confidence, location)
            .with_pattern(class.label);
        if let Some(ecosystem) = class.ecosystem {
            command = command.with_ecosystem(ecosystem.as_str());
        }
        if let Some(language) = class.language {
            command = command.with_language(language);
        }
        if let Some(heading) = description {
            command = command.with_description(heading);
        }
        command
    }
}

impl Default for CommandExtractor {
    fn default() -> Self {
        Self::builtin()
    }
}

fn is_data_fence(fence: &CodeFence) -> bool {
    fence
        .language
        .as_deref()
        .is_some_and(|tag| DATA_FENCE_TAGS.contains(&tag))
}

/// Logical lines with prompts and trailing comments removed.
///
/// In a transcript-style fence (some lines carry a shell prompt) only the
/// prompted lines are commands; the rest is program output. A fence holding
/// package-manager script echoes drops every `> ` line as output too.
fn command_lines(fence: &CodeFence, source_lines: &[&str]) -> Vec<LogicalLine> {
    let lines = logical_lines(fence, source_lines);
    let transcript = lines.iter().any(|line| has_shell_prompt(line.text.trim()));
    let echoes = lines.iter().any(|line| is_script_echo(line.text.trim()));

    lines
        .into_iter()
        .filter_map(|mut line| {
            let trimmed = line.text.trim();
            if transcript && !has_shell_prompt(trimmed) {
                return None;
            }
            if echoes && trimmed.starts_with('>') {
                return None;
            }
            line.text = strip_trailing_comment(strip_prompt(trimmed)).to_string();
            Some(line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown;
    use doc_commands_core::CommandCategory;

    fn extract(text: &str) -> CommandInfo {
        let doc = markdown::parse(text).unwrap();
        CommandExtractor::builtin().extract(&doc, text).unwrap()
    }

    #[test]
    fn test_extract_readme_sections() {
        let text = "\
# Demo

## Installation

```bash
npm install
```

## Development

```bash
npm run build
npm test
```
";
        let info = extract(text);
        assert_eq!(info.texts(CommandCategory::Install), vec!["npm install"]);
        assert_eq!(info.texts(CommandCategory::Build), vec!["npm run build"]);
        assert_eq!(info.texts(CommandCategory::Test), vec!["npm test"]);
        assert!(info.other.is_empty());
        assert_eq!(info.install[0].description(), Some("Installation"));
        assert_eq!(info.test[0].source_location().start_line, 13);
        assert_eq!(info.extraction_metadata.code_blocks_scanned, 2);
    }

    #[test]
    fn test_extract_skips_unterminated_fence_with_warning() {
        let text = "```sh\nmake\n```\n\n```sh\ncargo build\n";
        let info = extract(text);
        assert_eq!(info.texts(CommandCategory::Build), vec!["make"]);
        assert_eq!(info.extraction_metadata.skipped_blocks, 1);
        assert_eq!(info.extraction_metadata.warnings.len(), 1);
        assert!(info.extraction_metadata.warnings[0].contains("line 5"));
    }

    #[test]
    fn test_extract_counts_duplicates_and_keeps_first() {
        let text = "## A\n\n```sh\nnpm install\n```\n\n## B\n\n```sh\nnpm install\n```\n";
        let info = extract(text);
        assert_eq!(info.install.len(), 1);
        assert_eq!(info.install[0].description(), Some("A"));
        assert_eq!(info.extraction_metadata.duplicates_skipped, 1);
    }

    #[test]
    fn test_extract_splits_chains_and_drops_navigation() {
        let text = "```sh\ngit clone https://example.com/repo.git\ncd repo && pip install -r requirements.txt && pytest\n```\n";
        let info = extract(text);
        assert_eq!(info.texts(CommandCategory::Install), vec!["pip install -r requirements.txt"]);
        assert_eq!(info.texts(CommandCategory::Test), vec!["pytest"]);
        assert!(!info.iter().any(|cmd| cmd.text().starts_with("cd")));
    }

    #[test]
    fn test_extract_transcript_ignores_output_lines() {
        let text = "```console\n$ cargo test\n   Compiling demo v0.1.0\ntest result: ok\n```\n";
        let info = extract(text);
        assert_eq!(info.len(), 1);
        assert_eq!(info.test[0].text(), "cargo test");
    }

    #[test]
    fn test_extract_ignores_lifecycle_script_echoes() {
        let text = "```\nnpm install\n\n> widget@1.0.0 postinstall\n> node scripts/setup.js\n```\n";
        let info = extract(text);
        assert_eq!(info.texts(CommandCategory::Install), vec!["npm install"]);
        assert!(info.other.is_empty());
        assert_eq!(info.len(), 1);
    }

    #[test]
    fn test_extract_angle_prompts_without_transcript() {
        let text = "```\n> yarn\n> yarn test\n```\n";
        let info = extract(text);
        assert_eq!(info.texts(CommandCategory::Install), vec!["yarn"]);
        assert_eq!(info.texts(CommandCategory::Test), vec!["yarn test"]);
    }

    #[test]
    fn test_extract_ignores_data_fences_and_env_rows() {
        let text = "```json\n{\"scripts\": {\"test\": \"npm test\"}}\n```\n\n```sh\nexport NODE_ENV=production\nnpm start\n```\n";
        let info = extract(text);
        assert_eq!(info.len(), 1);
        assert_eq!(info.other[0].text(), "npm start");
    }

    #[test]
    fn test_extract_joins_continuation_lines() {
        let text = "```sh\ncargo build \\\n  --release\n```\n";
        let info = extract(text);
        let cmd = &info.build[0];
        assert_eq!(cmd.text(), "cargo build --release");
        assert_eq!(cmd.source_location().start_line, 2);
        assert_eq!(cmd.source_location().end_line, 3);
    }

    #[test]
    fn test_new_accepts_extended_table() {
        let mut table = PatternTable::builtin().clone();
        let rule = PatternRule::new(CommandCategory::Build, r"^cargo\s+xtask\b", 0.8, "xtask").unwrap();
        table.add_rule(Ecosystem::Cargo, rule).unwrap();
        assert!(CommandExtractor::new(table).is_ok());
    }
}
