//! Block-level document tree produced by the markdown front-end.

use doc_commands_core::SourceRange;

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFence {
    /// First word of the info string, lowercased (`bash`, `python`).
    pub language: Option<String>,
    /// Full info string after the opening fence.
    pub info: String,
    /// Content between the fences with the fence indentation removed.
    pub content: String,
    /// 1-based line number of the first content line.
    pub content_start_line: usize,
    /// Number of leading characters removed from each content line.
    pub indent: usize,
    /// `false` when the input ended before a closing fence.
    pub closed: bool,
}

impl CodeFence {
    /// Iterates content lines with their 1-based document line numbers.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.content
            .lines()
            .enumerate()
            .map(move |(offset, line)| (self.content_start_line + offset, line))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Heading { level: u8, text: String },
    CodeFence(CodeFence),
    Paragraph { text: String },
    List { items: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub range: SourceRange,
}

impl Block {
    pub fn as_code_fence(&self) -> Option<&CodeFence> {
        match &self.kind {
            BlockKind::CodeFence(fence) => Some(fence),
            _ => None,
        }
    }

    pub fn as_heading(&self) -> Option<(u8, &str)> {
        match &self.kind {
            BlockKind::Heading { level, text } => Some((*level, text.as_str())),
            _ => None,
        }
    }

    /// Prose carried by paragraphs and lists, `None` for other blocks.
    pub fn prose(&self) -> Option<String> {
        match &self.kind {
            BlockKind::Paragraph { text } => Some(text.clone()),
            BlockKind::List { items } => Some(items.join("\n")),
            _ => None,
        }
    }
}

/// Ordered block sequence for one document. Read-only once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub line_count: usize,
}

impl Document {
    /// Code fences in document order.
    pub fn code_fences(&self) -> impl Iterator<Item = (&Block, &CodeFence)> {
        self.blocks
            .iter()
            .filter_map(|block| block.as_code_fence().map(|fence| (block, fence)))
    }

    /// Headings in document order as `(block, level, text)`.
    pub fn headings(&self) -> impl Iterator<Item = (&Block, u8, &str)> {
        self.blocks.iter().filter_map(|block| {
            block
                .as_heading()
                .map(|(level, text)| (block, level, text))
        })
    }

    /// Text of the last heading that starts before `line`.
    pub fn heading_before(&self, line: usize) -> Option<&str> {
        self.headings()
            .take_while(|(block, _, _)| block.range.start_line < line)
            .last()
            .map(|(_, _, text)| text)
    }

    /// Range covering the whole document.
    pub fn full_range(&self) -> SourceRange {
        SourceRange::new(1, 1, self.line_count.max(1), usize::MAX)
    }
}
