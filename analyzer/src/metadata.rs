//! Project metadata: name, description, license and section outline.

use std::sync::LazyLock;

use doc_commands_core::ProjectMetadata;
use regex::Regex;

use crate::markdown::{BlockKind, Document};

static LICENSE_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blicen[cs]e\b").expect("static regex must compile"));

static SPDX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(MIT|Apache-2\.0|Apache License,? Version 2\.0|(?:A|L)?GPL-?[23]\.0(?:-only|-or-later)?|LGPL-2\.1|BSD-[234]-Clause|MPL-2\.0|ISC|Unlicense|CC0-1\.0|0BSD)\b",
    )
    .expect("static regex must compile")
});

/// Extracts metadata and its confidence (found fields out of three).
///
/// ```
/// use doc_commands_analyzer::{markdown, metadata::extract_metadata};
///
/// let text = "# widget\n\nA tiny widget.\n\n## License\n\nMIT\n";
/// let doc = markdown::parse(text).unwrap();
/// let (meta, confidence) = extract_metadata(&doc, text);
/// assert_eq!(meta.name.as_deref(), Some("widget"));
/// assert_eq!(meta.license.as_deref(), Some("MIT"));
/// assert_eq!(confidence, 1.0);
/// ```
pub fn extract_metadata(document: &Document, raw_text: &str) -> (ProjectMetadata, f64) {
    let name = document
        .headings()
        .find(|(_, level, _)| *level == 1)
        .map(|(_, _, text)| text.to_string())
        .filter(|text| !text.is_empty());

    let description = document.blocks.iter().find_map(|block| match &block.kind {
        BlockKind::Paragraph { text } if !is_decoration(text) => {
            Some(text.lines().map(str::trim).collect::<Vec<_>>().join(" "))
        }
        _ => None,
    });

    let license = license_from_section(document).or_else(|| spdx_mention(raw_text));

    let sections = document
        .headings()
        .map(|(_, _, text)| text.to_string())
        .collect();

    let found = [name.is_some(), description.is_some(), license.is_some()]
        .into_iter()
        .filter(|present| *present)
        .count();

    let metadata = ProjectMetadata {
        name,
        description,
        license,
        sections,
    };
    (metadata, found as f64 / 3.0)
}

/// Badge rows, images and raw HTML are not descriptions.
fn is_decoration(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with("[![") || trimmed.starts_with("![") || trimmed.starts_with('<')
}

fn license_from_section(document: &Document) -> Option<String> {
    let start = document
        .blocks
        .iter()
        .position(|block| {
            block
                .as_heading()
                .is_some_and(|(_, text)| LICENSE_HEADING_RE.is_match(text))
        })?;

    let prose = document.blocks[start + 1..]
        .iter()
        .take_while(|block| block.as_heading().is_none())
        .find_map(|block| block.prose())?;

    spdx_mention(&prose).or_else(|| prose.lines().next().map(|line| line.trim().to_string()))
}

fn spdx_mention(text: &str) -> Option<String> {
    SPDX_RE.find(text).map(|found| normalize_license(found.as_str()))
}

fn normalize_license(raw: &str) -> String {
    if raw.starts_with("Apache License") {
        "Apache-2.0".to_string()
    } else {
        raw.to_string()
    }
}
