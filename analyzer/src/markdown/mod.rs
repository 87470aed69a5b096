//! Line-based markdown front-end.
//!
//! Produces the block sequence the rest of the analyzer consumes: ATX and
//! setext headings, fenced code blocks (backtick or tilde), paragraphs, and
//! list runs, each with its 1-based source range. Inline markup is kept as
//! written. An unterminated fence is not an error here; it is returned with
//! `closed == false` so the extractor can skip it with a warning.

mod ast;

use std::sync::LazyLock;

use doc_commands_core::SourceRange;
use regex::Regex;
use tracing::debug;

pub use ast::{Block, BlockKind, CodeFence, Document};

use crate::error::ParseError;

/// Documents larger than this are rejected unless configured otherwise.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

static PATTERNS: LazyLock<MarkdownPatterns> = LazyLock::new(MarkdownPatterns::new);

struct MarkdownPatterns {
    fence_open: Regex,
    atx_heading: Regex,
    setext_h1: Regex,
    setext_h2: Regex,
    list_item: Regex,
}

impl MarkdownPatterns {
    fn new() -> Self {
        Self {
            fence_open: Regex::new(r"^(\s*)(`{3,}|~{3,})\s*(.*?)\s*$")
                .expect("static regex must compile"),
            atx_heading: Regex::new(r"^ {0,3}(#{1,6})(?:\s+(.*?))?\s*$")
                .expect("static regex must compile"),
            setext_h1: Regex::new(r"^ {0,3}=+\s*$").expect("static regex must compile"),
            setext_h2: Regex::new(r"^ {0,3}-{2,}\s*$").expect("static regex must compile"),
            list_item: Regex::new(r"^\s*(?:[-*+]|\d{1,9}[.)])\s+(.*)$")
                .expect("static regex must compile"),
        }
    }
}

/// Parses `text` with the default size limit.
///
/// # Examples
///
/// ```
/// use doc_commands_analyzer::markdown::{self, BlockKind};
///
/// let doc = markdown::parse("# Demo\n\n```bash\nnpm install\n```\n").unwrap();
/// assert_eq!(doc.blocks.len(), 2);
/// let (block, fence) = doc.code_fences().next().unwrap();
/// assert_eq!(fence.language.as_deref(), Some("bash"));
/// assert_eq!(fence.content, "npm install");
/// assert_eq!(block.range.start_line, 3);
/// assert!(matches!(doc.blocks[0].kind, BlockKind::Heading { level: 1, .. }));
/// ```
pub fn parse(text: &str) -> Result<Document, ParseError> {
    parse_with_limit(text, DEFAULT_MAX_DOCUMENT_BYTES)
}

/// Parses `text`, rejecting documents longer than `max_bytes` or containing
/// NUL bytes.
pub fn parse_with_limit(text: &str, max_bytes: usize) -> Result<Document, ParseError> {
    if text.len() > max_bytes {
        return Err(ParseError::TooLarge {
            size: text.len(),
            limit: max_bytes,
        });
    }
    if let Some(offset) = text.find('\0') {
        return Err(ParseError::NulByte { offset });
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut builder = BlockBuilder::default();
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];
        let number = index + 1;

        if let Some(caps) = PATTERNS.fence_open.captures(line) {
            let marker = &caps[2];
            let info = caps[3].to_string();
            // Backtick fences cannot carry backticks in their info string.
            if !(marker.starts_with('`') && info.contains('`')) {
                builder.flush();
                index = read_fence(&lines, index, caps[1].chars().count(), marker, info, &mut builder);
                continue;
            }
        }

        if let Some(caps) = PATTERNS.atx_heading.captures(line) {
            builder.flush();
            let level = caps[1].len() as u8;
            let text = caps
                .get(2)
                .map(|m| m.as_str().trim_end_matches('#').trim().to_string())
                .unwrap_or_default();
            builder.push(Block {
                kind: BlockKind::Heading { level, text },
                range: SourceRange::single_line(number, 1, char_len(line).max(1)),
            });
            index += 1;
            continue;
        }

        if line.trim().is_empty() {
            builder.flush();
            index += 1;
            continue;
        }

        if builder.has_paragraph() && PATTERNS.setext_h1.is_match(line) {
            builder.promote_paragraph(1, number, line);
            index += 1;
            continue;
        }
        if builder.has_paragraph() && PATTERNS.setext_h2.is_match(line) {
            builder.promote_paragraph(2, number, line);
            index += 1;
            continue;
        }

        if let Some(caps) = PATTERNS.list_item.captures(line) {
            builder.list_item(caps[1].trim(), number, line);
        } else {
            builder.text_line(line, number);
        }
        index += 1;
    }
    builder.flush();

    let document = Document {
        blocks: builder.blocks,
        line_count: lines.len(),
    };
    debug!(
        blocks = document.blocks.len(),
        lines = document.line_count,
        "Parsed markdown document"
    );
    Ok(document)
}

/// Reads a fence starting at `open_index` and returns the index after it.
fn read_fence(
    lines: &[&str],
    open_index: usize,
    indent: usize,
    marker: &str,
    info: String,
    builder: &mut BlockBuilder,
) -> usize {
    let fence_char = marker.chars().next().unwrap_or('`');
    let fence_len = marker.len();
    let mut content = Vec::new();
    let mut index = open_index + 1;
    let mut closed = false;

    while index < lines.len() {
        let line = lines[index];
        if is_closing_fence(line, fence_char, fence_len) {
            closed = true;
            break;
        }
        content.push(strip_indent(line, indent));
        index += 1;
    }

    let end_index = if closed {
        index
    } else {
        lines.len().saturating_sub(1).max(open_index)
    };
    let language = info
        .split_whitespace()
        .next()
        .map(|word| word.trim_start_matches('{').trim_start_matches('.').to_ascii_lowercase())
        .filter(|word| !word.is_empty());

    builder.push(Block {
        kind: BlockKind::CodeFence(CodeFence {
            language,
            info,
            content: content.join("\n"),
            content_start_line: open_index + 2,
            indent,
            closed,
        }),
        range: SourceRange::new(
            open_index + 1,
            1,
            end_index + 1,
            char_len(lines[end_index]).max(1),
        ),
    });

    if closed { index + 1 } else { lines.len() }
}

fn is_closing_fence(line: &str, fence_char: char, fence_len: usize) -> bool {
    let trimmed = line.trim();
    let run = trimmed.chars().take_while(|&ch| ch == fence_char).count();
    run >= fence_len && trimmed.chars().skip(run).all(char::is_whitespace)
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let mut stripped = line;
    for _ in 0..indent {
        match stripped.strip_prefix(' ') {
            Some(rest) => stripped = rest,
            None => break,
        }
    }
    stripped
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    paragraph: Vec<String>,
    list: Vec<String>,
    start_line: usize,
    end_line: usize,
    end_column: usize,
}

impl BlockBuilder {
    fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    fn has_paragraph(&self) -> bool {
        !self.paragraph.is_empty()
    }

    fn begin(&mut self, number: usize) {
        if self.paragraph.is_empty() && self.list.is_empty() {
            self.start_line = number;
        }
    }

    fn extend_to(&mut self, number: usize, line: &str) {
        self.end_line = number;
        self.end_column = char_len(line).max(1);
    }

    fn text_line(&mut self, line: &str, number: usize) {
        if let Some(last) = self.list.last_mut() {
            // Lazy continuation of the current list item.
            last.push(' ');
            last.push_str(line.trim());
        } else {
            self.begin(number);
            self.paragraph.push(line.trim().to_string());
        }
        self.extend_to(number, line);
    }

    fn list_item(&mut self, item: &str, number: usize, line: &str) {
        if !self.paragraph.is_empty() {
            self.flush();
        }
        self.begin(number);
        self.list.push(item.to_string());
        self.extend_to(number, line);
    }

    fn promote_paragraph(&mut self, level: u8, number: usize, underline: &str) {
        let text = self.paragraph.join(" ");
        let range = SourceRange::new(
            self.start_line,
            1,
            number,
            char_len(underline).max(1),
        );
        self.paragraph.clear();
        self.blocks.push(Block {
            kind: BlockKind::Heading { level, text },
            range,
        });
    }

    fn flush(&mut self) {
        let range = SourceRange::new(self.start_line, 1, self.end_line, self.end_column);
        if !self.paragraph.is_empty() {
            let text = self.paragraph.join("\n");
            self.paragraph.clear();
            self.blocks.push(Block {
                kind: BlockKind::Paragraph { text },
                range,
            });
        }
        if !self.list.is_empty() {
            let items = std::mem::take(&mut self.list);
            self.blocks.push(Block {
                kind: BlockKind::List { items },
                range,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_fence_ranges_and_tags() {
        let text = "# Title\n\nSome intro.\n\n```python\nimport os\nprint(os.name)\n```\n";
        let doc = parse(text).unwrap();

        let (block, fence) = doc.code_fences().next().unwrap();
        assert_eq!(fence.language.as_deref(), Some("python"));
        assert_eq!(fence.content_start_line, 6);
        assert!(fence.closed);
        assert_eq!(block.range.start_line, 5);
        assert_eq!(block.range.end_line, 8);

        let lines: Vec<_> = fence.numbered_lines().collect();
        assert_eq!(lines, vec![(6, "import os"), (7, "print(os.name)")]);
    }

    #[test]
    fn test_parse_marks_unterminated_fence() {
        let doc = parse("## Setup\n```sh\nmake\nmake test\n").unwrap();
        let (block, fence) = doc.code_fences().next().unwrap();
        assert!(!fence.closed);
        assert_eq!(fence.content, "make\nmake test");
        assert_eq!(block.range.end_line, 4);
    }

    #[test]
    fn test_parse_tilde_fence_and_longer_backtick_run() {
        let doc = parse("~~~\ncargo build\n~~~\n\n````md\n```\ninner\n```\n````\n").unwrap();
        let fences: Vec<_> = doc.code_fences().map(|(_, f)| f).collect();
        assert_eq!(fences.len(), 2);
        assert_eq!(fences[0].content, "cargo build");
        assert_eq!(fences[1].content, "```\ninner\n```");
    }

    #[test]
    fn test_parse_headings_lists_and_setext() {
        let text = "Project\n=======\n\nIntro text\nspans lines.\n\n- one\n- two\n  continued\n\n### Usage ###\n";
        let doc = parse(text).unwrap();

        assert_eq!(doc.blocks[0].as_heading(), Some((1, "Project")));
        assert_eq!(
            doc.blocks[1].kind,
            BlockKind::Paragraph {
                text: "Intro text\nspans lines.".to_string()
            }
        );
        assert_eq!(
            doc.blocks[2].kind,
            BlockKind::List {
                items: vec!["one".to_string(), "two continued".to_string()]
            }
        );
        assert_eq!(doc.blocks[3].as_heading(), Some((3, "Usage")));
    }

    #[test]
    fn test_parse_strips_fence_indentation() {
        let doc = parse("1. Install:\n\n   ```bash\n   npm ci\n   ```\n").unwrap();
        let (_, fence) = doc.code_fences().next().unwrap();
        assert_eq!(fence.indent, 3);
        assert_eq!(fence.content, "npm ci");
    }

    #[test]
    fn test_parse_rejects_nul_and_oversized_input() {
        assert_eq!(parse("abc\0def"), Err(ParseError::NulByte { offset: 3 }));
        assert_eq!(
            parse_with_limit("0123456789", 4),
            Err(ParseError::TooLarge { size: 10, limit: 4 })
        );
    }

    #[test]
    fn test_heading_before_finds_enclosing_section() {
        let doc = parse("# A\n\n## Install\n\n```\nnpm i\n```\n").unwrap();
        assert_eq!(doc.heading_before(6), Some("Install"));
        assert_eq!(doc.heading_before(1), None);
    }

    #[test]
    fn test_empty_document_has_no_blocks() {
        let doc = parse("").unwrap();
        assert!(doc.blocks.is_empty());
        assert_eq!(doc.line_count, 0);
    }
}
