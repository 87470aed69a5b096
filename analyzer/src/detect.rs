//! Language context detection.
//!
//! Three signals produce contexts, from most to least specific:
//!
//! - a code fence tagged with a programming language covers that fence,
//! - a heading naming a language covers its section,
//! - manifest file mentions (`package.json`, `Cargo.toml`, ...) produce one
//!   document-wide context for the most-mentioned language.
//!
//! Shell fence tags (`bash`, `sh`, `console`) carry no language.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use doc_commands_core::{Evidence, EvidenceKind, LanguageContext, SourceRange};
use regex::Regex;
use tracing::debug;

use crate::markdown::Document;

/// Confidence of a context taken from a fence tag.
pub const FENCE_TAG_CONFIDENCE: f64 = 0.9;

/// Confidence of a context taken from a section heading.
pub const HEADING_CONFIDENCE: f64 = 0.7;

/// Confidence of a document-wide context backed by one manifest mention.
pub const MANIFEST_BASE_CONFIDENCE: f64 = 0.4;

/// Added per additional manifest mention.
pub const MANIFEST_STEP: f64 = 0.1;

/// Upper bound for manifest-derived confidence.
pub const MANIFEST_MAX_CONFIDENCE: f64 = 0.7;

/// Maps a fence tag to a language name.
pub fn language_for_fence_tag(tag: &str) -> Option<&'static str> {
    let language = match tag.to_ascii_lowercase().as_str() {
        "js" | "javascript" | "jsx" | "mjs" | "cjs" | "node" | "ts" | "typescript" | "tsx" => {
            "JavaScript"
        }
        "python" | "py" | "python3" | "py3" | "pycon" => "Python",
        "rust" | "rs" => "Rust",
        "go" | "golang" => "Go",
        "java" => "Java",
        "kotlin" | "kt" => "Kotlin",
        "csharp" | "cs" | "c#" => "C#",
        "ruby" | "rb" => "Ruby",
        "php" => "PHP",
        "scala" => "Scala",
        "clojure" | "clj" => "Clojure",
        "elixir" | "ex" | "exs" => "Elixir",
        "swift" => "Swift",
        "c" => "C",
        "cpp" | "c++" | "cxx" => "C++",
        _ => return None,
    };
    Some(language)
}

static HEADING_LANGUAGES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\b(?:javascript|typescript|node\.?js)\b", "JavaScript"),
        (r"(?i)\bpython\b", "Python"),
        (r"(?i)\brust\b", "Rust"),
        // Case-sensitive: "go" is also an English verb.
        (r"\bGo(?:lang)?\b", "Go"),
        (r"(?i)\bjava\b", "Java"),
        (r"(?i)(?:\bc#|\.net\b|\bcsharp\b)", "C#"),
        (r"(?i)\bruby\b", "Ruby"),
        (r"\bPHP\b", "PHP"),
        (r"(?i)\bscala\b", "Scala"),
        (r"(?i)\belixir\b", "Elixir"),
        (r"(?i)\bclojure\b", "Clojure"),
    ]
    .into_iter()
    .map(|(pattern, language)| {
        (Regex::new(pattern).expect("static regex must compile"), language)
    })
    .collect()
});

static MANIFESTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bpackage\.json\b", "JavaScript"),
        (r"\b(?:requirements[\w-]*\.txt|pyproject\.toml|setup\.py|Pipfile)\b", "Python"),
        (r"\bCargo\.toml\b", "Rust"),
        (r"\bgo\.mod\b", "Go"),
        (r"\b(?:pom\.xml|build\.gradle(?:\.kts)?)\b", "Java"),
        (r"\bGemfile\b", "Ruby"),
        (r"\bcomposer\.json\b", "PHP"),
        (r"\b[\w.-]+\.csproj\b", "C#"),
        (r"\bmix\.exs\b", "Elixir"),
    ]
    .into_iter()
    .map(|(pattern, language)| {
        (Regex::new(pattern).expect("static regex must compile"), language)
    })
    .collect()
});

/// Produces the document's language contexts.
#[derive(Debug, Clone, Copy)]
pub struct LanguageDetector {
    created_at: DateTime<Utc>,
}

impl LanguageDetector {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self { created_at }
    }

    /// Contexts sorted by (start line, end line, language).
    ///
    /// ```
    /// use chrono::{DateTime, Utc};
    /// use doc_commands_analyzer::{detect::LanguageDetector, markdown};
    ///
    /// let text = "## Python usage\n\n```python\nimport demo\n```\n";
    /// let doc = markdown::parse(text).unwrap();
    /// let contexts = LanguageDetector::new(DateTime::<Utc>::UNIX_EPOCH).detect(&doc, text);
    /// assert_eq!(contexts.len(), 2);
    /// assert!(contexts.iter().all(|ctx| ctx.language == "Python"));
    /// ```
    pub fn detect(&self, document: &Document, raw_text: &str) -> Vec<LanguageContext> {
        let mut contexts = Vec::new();
        contexts.extend(self.fence_contexts(document));
        contexts.extend(self.heading_contexts(document));
        contexts.extend(self.manifest_context(document, raw_text));

        contexts.sort_by(|a, b| {
            (a.source_range.start_line, a.source_range.end_line, &a.language)
                .cmp(&(b.source_range.start_line, b.source_range.end_line, &b.language))
        });
        debug!(contexts = contexts.len(), "Detected language contexts");
        contexts
    }

    fn fence_contexts<'a>(&'a self, document: &'a Document) -> impl Iterator<Item = LanguageContext> + 'a {
        document.code_fences().filter_map(|(block, fence)| {
            let tag = fence.language.as_deref()?;
            let language = language_for_fence_tag(tag)?;
            Some(
                LanguageContext::detected(language, FENCE_TAG_CONFIDENCE, block.range, self.created_at)
                    .with_evidence(Evidence::new(EvidenceKind::FenceTag, tag, block.range.start_line)),
            )
        })
    }

    fn heading_contexts(&self, document: &Document) -> Vec<LanguageContext> {
        let headings: Vec<_> = document.headings().collect();
        let last_line = document.line_count.max(1);
        let mut out = Vec::new();

        for (idx, (block, level, text)) in headings.iter().enumerate() {
            let Some(language) = heading_language(text) else {
                continue;
            };
            let end_line = headings[idx + 1..]
                .iter()
                .find(|(_, next_level, _)| next_level <= level)
                .map(|(next, _, _)| next.range.start_line.saturating_sub(1))
                .unwrap_or(last_line)
                .max(block.range.start_line);
            let range = SourceRange::new(block.range.start_line, 1, end_line, usize::MAX);
            out.push(
                LanguageContext::detected(language, HEADING_CONFIDENCE, range, self.created_at)
                    .with_evidence(Evidence::new(EvidenceKind::Heading, *text, block.range.start_line)),
            );
        }
        out
    }

    fn manifest_context(&self, document: &Document, raw_text: &str) -> Option<LanguageContext> {
        // language -> (mentions, evidence)
        let mut tally: BTreeMap<&'static str, (usize, Vec<Evidence>)> = BTreeMap::new();
        for (offset, line) in raw_text.lines().enumerate() {
            for (pattern, language) in MANIFESTS.iter() {
                for found in pattern.find_iter(line) {
                    let entry = tally.entry(*language).or_default();
                    entry.0 += 1;
                    entry
                        .1
                        .push(Evidence::new(EvidenceKind::ManifestFile, found.as_str(), offset + 1));
                }
            }
        }

        // BTreeMap iteration is alphabetical, so ties keep the first name.
        let (language, (mentions, evidence)) = tally
            .into_iter()
            .fold(None, |best: Option<(&str, (usize, Vec<Evidence>))>, entry| match best {
                Some(current) if current.1.0 >= entry.1.0 => Some(current),
                _ => Some(entry),
            })?;

        let confidence = (MANIFEST_BASE_CONFIDENCE + MANIFEST_STEP * (mentions - 1) as f64)
            .min(MANIFEST_MAX_CONFIDENCE);
        let mut context =
            LanguageContext::detected(language, confidence, document.full_range(), self.created_at);
        context.evidence = evidence;
        Some(context)
    }
}

fn heading_language(text: &str) -> Option<&'static str> {
    HEADING_LANGUAGES
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, language)| *language)
}
