//! Declarative classification tables.
//!
//! Each [`Ecosystem`] owns the tool names that route a command to it and an
//! ordered list of [`PatternRule`]s. [`PatternTable::classify`] walks the
//! categories in [`CommandCategory::PRIORITY`] order and stops at the first
//! rule that matches, so a command can never land in two categories. Rule
//! order inside one category is declaration order.
//!
//! Toolchain overrides are expressed as table placement: `go install`,
//! `mvn install` and `make install` are build rules because those tools
//! compile and install a local artifact rather than fetch dependencies.
//! Guards are explicit `exclude` patterns (the `regex` crate has no
//! lookahead), e.g. the generic `python -m <module>` build rule excludes
//! `pip`, `pytest` and `unittest`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use doc_commands_core::CommandCategory;
use regex::Regex;

use super::filter::split_invocation;
use crate::error::ExtractionError;

/// Confidence of the whole-word install keyword fallback.
pub const KEYWORD_INSTALL_CONFIDENCE: f64 = 0.6;

/// Confidence of the catch-all `other` fallback.
pub const KEYWORD_OTHER_CONFIDENCE: f64 = 0.4;

static INSTALL_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(install|add|get|restore|download)\b").expect("static regex must compile")
});

/// Toolchain family that owns a set of rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ecosystem {
    Npm,
    Yarn,
    Pnpm,
    Bun,
    Deno,
    Python,
    Cargo,
    Go,
    Maven,
    Gradle,
    Dotnet,
    Bundle,
    Composer,
    Mix,
    Sbt,
    Lein,
    Ant,
    Make,
    Cmake,
    Docker,
    /// Executable paths and shell scripts (`./configure`, `build.sh`).
    Script,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 21] = [
        Ecosystem::Npm,
        Ecosystem::Yarn,
        Ecosystem::Pnpm,
        Ecosystem::Bun,
        Ecosystem::Deno,
        Ecosystem::Python,
        Ecosystem::Cargo,
        Ecosystem::Go,
        Ecosystem::Maven,
        Ecosystem::Gradle,
        Ecosystem::Dotnet,
        Ecosystem::Bundle,
        Ecosystem::Composer,
        Ecosystem::Mix,
        Ecosystem::Sbt,
        Ecosystem::Lein,
        Ecosystem::Ant,
        Ecosystem::Make,
        Ecosystem::Cmake,
        Ecosystem::Docker,
        Ecosystem::Script,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
            Self::Bun => "bun",
            Self::Deno => "deno",
            Self::Python => "pip",
            Self::Cargo => "cargo",
            Self::Go => "go",
            Self::Maven => "maven",
            Self::Gradle => "gradle",
            Self::Dotnet => "dotnet",
            Self::Bundle => "bundle",
            Self::Composer => "composer",
            Self::Mix => "mix",
            Self::Sbt => "sbt",
            Self::Lein => "lein",
            Self::Ant => "ant",
            Self::Make => "make",
            Self::Cmake => "cmake",
            Self::Docker => "docker",
            Self::Script => "script",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ecosystem {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let alias = match wanted.as_str() {
            "python" => "pip",
            "mvn" => "maven",
            "bundler" | "ruby" => "bundle",
            other => other,
        };
        Ecosystem::ALL
            .into_iter()
            .find(|eco| eco.as_str() == alias)
            .ok_or_else(|| ExtractionError::PatternEvaluation(format!("unknown ecosystem '{s}'")))
    }
}

/// One classification rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub category: CommandCategory,
    pub pattern: Regex,
    /// Lines matching this are never claimed by the rule.
    pub exclude: Option<Regex>,
    pub confidence: f64,
    pub label: String,
}

impl PatternRule {
    pub fn new(
        category: CommandCategory,
        pattern: &str,
        confidence: f64,
        label: impl Into<String>,
    ) -> Result<Self, ExtractionError> {
        Ok(Self {
            category,
            pattern: compile(pattern)?,
            exclude: None,
            confidence,
            label: label.into(),
        })
    }

    /// Adds an exclusion guard.
    pub fn excluding(mut self, pattern: &str) -> Result<Self, ExtractionError> {
        self.exclude = Some(compile(pattern)?);
        Ok(self)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
            && !self
                .exclude
                .as_ref()
                .is_some_and(|guard| guard.is_match(text))
    }
}

fn compile(pattern: &str) -> Result<Regex, ExtractionError> {
    Regex::new(pattern)
        .map_err(|err| ExtractionError::PatternEvaluation(format!("invalid pattern '{pattern}': {err}")))
}

/// Rules and routing tools for one ecosystem.
#[derive(Debug, Clone)]
pub struct EcosystemPatterns {
    pub ecosystem: Ecosystem,
    pub tools: Vec<&'static str>,
    /// Language implied by invoking one of `tools`.
    pub language: Option<&'static str>,
    pub rules: Vec<PatternRule>,
}

impl EcosystemPatterns {
    /// Rules of one category, in evaluation order.
    pub fn rules_for(&self, category: CommandCategory) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().filter(move |rule| rule.category == category)
    }
}

/// Outcome of classifying one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: CommandCategory,
    pub confidence: f64,
    pub ecosystem: Option<Ecosystem>,
    pub language: Option<&'static str>,
    pub label: String,
}

/// Ordered ecosystem → category → rule table.
///
/// # Examples
///
/// ```
/// use doc_commands_analyzer::extractor::PatternTable;
/// use doc_commands_core::CommandCategory;
///
/// let table = PatternTable::builtin();
/// assert_eq!(table.classify("go install ./cmd/tool").category, CommandCategory::Build);
/// assert_eq!(table.classify("python -m pip install flask").category, CommandCategory::Install);
/// assert_eq!(table.classify("python -m pytest").category, CommandCategory::Test);
/// ```
#[derive(Debug, Clone)]
pub struct PatternTable {
    ecosystems: Vec<EcosystemPatterns>,
}

static BUILTIN: LazyLock<PatternTable> = LazyLock::new(|| {
    PatternTable::from_definitions(BUILTIN_TOOLS, BUILTIN_RULES)
        .expect("builtin pattern table must compile")
});

impl PatternTable {
    /// The built-in table.
    pub fn builtin() -> &'static PatternTable {
        &BUILTIN
    }

    fn from_definitions(tools: &[ToolDef], rules: &[RuleDef]) -> Result<Self, ExtractionError> {
        let mut ecosystems: Vec<EcosystemPatterns> = tools
            .iter()
            .map(|(ecosystem, language, names)| EcosystemPatterns {
                ecosystem: *ecosystem,
                tools: names.to_vec(),
                language: *language,
                rules: Vec::new(),
            })
            .collect();

        for (ecosystem, category, pattern, exclude, confidence, label) in rules {
            let mut rule = PatternRule::new(*category, pattern, *confidence, *label)?;
            if let Some(guard) = exclude {
                rule = rule.excluding(guard)?;
            }
            let Some(entry) = ecosystems.iter_mut().find(|e| e.ecosystem == *ecosystem) else {
                return Err(ExtractionError::PatternEvaluation(format!(
                    "rule '{label}' names ecosystem '{ecosystem}' without tools"
                )));
            };
            entry.rules.push(rule);
        }

        let table = Self { ecosystems };
        table.validate()?;
        Ok(table)
    }

    pub fn ecosystems(&self) -> &[EcosystemPatterns] {
        &self.ecosystems
    }

    pub fn get(&self, ecosystem: Ecosystem) -> Option<&EcosystemPatterns> {
        self.ecosystems.iter().find(|e| e.ecosystem == ecosystem)
    }

    /// Every routing tool name across ecosystems.
    pub fn known_tools(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ecosystems.iter().flat_map(|e| e.tools.iter().copied())
    }

    /// Finds the ecosystem a leading tool token belongs to.
    pub fn ecosystem_for_tool(&self, tool: &str) -> Option<&EcosystemPatterns> {
        let bare = tool.strip_prefix("./").unwrap_or(tool);
        self.ecosystems
            .iter()
            .find(|e| e.tools.iter().any(|name| *name == tool || *name == bare))
            .or_else(|| {
                looks_like_executable_path(tool)
                    .then(|| self.get(Ecosystem::Script))
                    .flatten()
            })
    }

    /// Appends a rule after the existing rules of its ecosystem.
    pub fn add_rule(&mut self, ecosystem: Ecosystem, rule: PatternRule) -> Result<(), ExtractionError> {
        validate_rule(&rule)?;
        match self.ecosystems.iter_mut().find(|e| e.ecosystem == ecosystem) {
            Some(entry) => {
                entry.rules.push(rule);
                Ok(())
            }
            None => Err(ExtractionError::PatternEvaluation(format!(
                "ecosystem '{ecosystem}' is not in the table"
            ))),
        }
    }

    /// Checks that every rule carries a confidence in [0, 1] and that no
    /// ecosystem appears twice.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        for (idx, entry) in self.ecosystems.iter().enumerate() {
            if self.ecosystems[..idx]
                .iter()
                .any(|prev| prev.ecosystem == entry.ecosystem)
            {
                return Err(ExtractionError::PatternEvaluation(format!(
                    "ecosystem '{}' defined twice",
                    entry.ecosystem
                )));
            }
            for rule in &entry.rules {
                validate_rule(rule)?;
            }
        }
        Ok(())
    }

    /// Classifies a normalized command segment.
    pub fn classify(&self, text: &str) -> Classification {
        let invocation = split_invocation(text);

        if let Some(entry) = self.ecosystem_for_tool(invocation.tool) {
            for category in CommandCategory::PRIORITY {
                if let Some(rule) = entry
                    .rules_for(category)
                    .find(|rule| rule.matches(invocation.body))
                {
                    return Classification {
                        category,
                        confidence: rule.confidence,
                        ecosystem: Some(entry.ecosystem),
                        language: entry.language,
                        label: rule.label.clone(),
                    };
                }
            }
            return keyword_fallback(invocation.body, Some(entry));
        }

        keyword_fallback(invocation.body, None)
    }
}

fn validate_rule(rule: &PatternRule) -> Result<(), ExtractionError> {
    if (0.0..=1.0).contains(&rule.confidence) {
        Ok(())
    } else {
        Err(ExtractionError::PatternEvaluation(format!(
            "rule '{}' has confidence {} outside [0, 1]",
            rule.label, rule.confidence
        )))
    }
}

fn keyword_fallback(text: &str, entry: Option<&EcosystemPatterns>) -> Classification {
    let (category, confidence, label) = if INSTALL_KEYWORD_RE.is_match(text) {
        (CommandCategory::Install, KEYWORD_INSTALL_CONFIDENCE, "keyword-install")
    } else {
        (CommandCategory::Other, KEYWORD_OTHER_CONFIDENCE, "keyword-other")
    };
    Classification {
        category,
        confidence,
        ecosystem: entry.map(|e| e.ecosystem),
        language: entry.and_then(|e| e.language),
        label: label.to_string(),
    }
}

/// `./path`, `*.exe`, or `*.sh` tokens.
pub fn looks_like_executable_path(token: &str) -> bool {
    token.starts_with("./")
        || token.ends_with(".sh")
        || token.to_ascii_lowercase().ends_with(".exe")
}

type ToolDef = (Ecosystem, Option<&'static str>, &'static [&'static str]);
type RuleDef = (
    Ecosystem,
    CommandCategory,
    &'static str,
    Option<&'static str>,
    f64,
    &'static str,
);

use CommandCategory::{Build, Install, Other, Test};
use Ecosystem as E;

const BUILTIN_TOOLS: &[ToolDef] = &[
    (E::Npm, Some("JavaScript"), &["npm", "npx", "node"]),
    (E::Yarn, Some("JavaScript"), &["yarn"]),
    (E::Pnpm, Some("JavaScript"), &["pnpm", "pnpx"]),
    (E::Bun, Some("JavaScript"), &["bun", "bunx"]),
    (E::Deno, Some("JavaScript"), &["deno"]),
    (
        E::Python,
        Some("Python"),
        &[
            "pip", "pip3", "python", "python3", "py", "pytest", "poetry", "pipenv", "tox",
            "conda", "uv",
        ],
    ),
    (E::Cargo, Some("Rust"), &["cargo", "rustup", "rustc"]),
    (E::Go, Some("Go"), &["go"]),
    (E::Maven, Some("Java"), &["mvn", "mvnw", "mvnw.cmd"]),
    (E::Gradle, Some("Java"), &["gradle", "gradlew", "gradlew.bat"]),
    (E::Dotnet, Some("C#"), &["dotnet"]),
    (E::Bundle, Some("Ruby"), &["bundle", "gem", "rake", "rspec", "rails", "ruby"]),
    (
        E::Composer,
        Some("PHP"),
        &["composer", "php", "phpunit", "vendor/bin/phpunit", "vendor/bin/pest"],
    ),
    (E::Mix, Some("Elixir"), &["mix"]),
    (E::Sbt, Some("Scala"), &["sbt"]),
    (E::Lein, Some("Clojure"), &["lein"]),
    (E::Ant, Some("Java"), &["ant"]),
    (E::Make, None, &["make", "gmake"]),
    (E::Cmake, None, &["cmake", "ctest"]),
    (E::Docker, None, &["docker", "docker-compose", "podman"]),
    (E::Script, None, &["bash", "sh", "zsh"]),
];

// Patterns are matched against the invocation body (sudo and leading
// `VAR=value` assignments removed).
/// Bare-tool install rules must not claim `--version` or `--help`.
const INFO_FLAG_GUARD: &str = r"\s--?(?:version|v|help|h)(?:\s|$)";

const BUILTIN_RULES: &[RuleDef] = &[
    // npm
    (E::Npm, Install, r"^npm\s+(?:install|i|ci|add)(?:\s|$)", None, 0.95, "npm-install"),
    (E::Npm, Build, r"^npm\s+run(?:-script)?\s+(?:build|compile|bundle|dist)(?::\S+)?(?:\s|$)", None, 0.9, "npm-run-build"),
    (E::Npm, Test, r"^npm\s+(?:test|t)(?:\s|$)", None, 0.95, "npm-test"),
    (E::Npm, Test, r"^npm\s+run(?:-script)?\s+test(?::\S+)?(?:\s|$)", None, 0.9, "npm-run-test"),
    (E::Npm, Test, r"^npx\s+(?:jest|mocha|vitest|ava|playwright\s+test|cypress\s+run)\b", None, 0.85, "npx-test-runner"),
    (E::Npm, Other, r"^npm\s+(?:start|run(?:-script)?\s+\S+)", None, 0.8, "npm-run-script"),
    (E::Npm, Other, r"^(?:npx|node)\s+\S+", None, 0.7, "node-exec"),
    // yarn
    (E::Yarn, Install, r"^yarn(?:\s+install)?(?:\s+--?\S+)*\s*$", Some(INFO_FLAG_GUARD), 0.9, "yarn-install"),
    (E::Yarn, Install, r"^yarn\s+(?:global\s+)?add\s+\S+", None, 0.9, "yarn-add"),
    (E::Yarn, Build, r"^yarn\s+(?:run\s+)?build(?::\S+)?(?:\s|$)", None, 0.9, "yarn-build"),
    (E::Yarn, Test, r"^yarn\s+(?:run\s+)?test(?::\S+)?(?:\s|$)", None, 0.9, "yarn-test"),
    (E::Yarn, Other, r"^yarn\s+(?:run\s+)?\S+", None, 0.75, "yarn-run-script"),
    // pnpm
    (E::Pnpm, Install, r"^pnpm\s+(?:install|i|add)(?:\s|$)", None, 0.95, "pnpm-install"),
    (E::Pnpm, Build, r"^pnpm\s+(?:run\s+)?build(?::\S+)?(?:\s|$)", None, 0.9, "pnpm-build"),
    (E::Pnpm, Test, r"^pnpm\s+(?:(?:run\s+)?test(?::\S+)?|t)(?:\s|$)", None, 0.9, "pnpm-test"),
    (E::Pnpm, Other, r"^pnpm\s+\S+", None, 0.75, "pnpm-run-script"),
    // bun
    (E::Bun, Install, r"^bun\s+(?:install|i|add)(?:\s|$)", None, 0.95, "bun-install"),
    (E::Bun, Build, r"^bun\s+(?:run\s+)?build\b", None, 0.9, "bun-build"),
    (E::Bun, Test, r"^bun\s+test\b", None, 0.95, "bun-test"),
    (E::Bun, Other, r"^bunx?\s+\S+", None, 0.7, "bun-run"),
    // deno
    (E::Deno, Install, r"^deno\s+(?:install|cache|add)\b", None, 0.9, "deno-install"),
    (E::Deno, Build, r"^deno\s+compile\b", None, 0.9, "deno-compile"),
    (E::Deno, Test, r"^deno\s+test\b", None, 0.95, "deno-test"),
    (E::Deno, Other, r"^deno\s+\S+", None, 0.7, "deno-run"),
    // python
    (E::Python, Install, r"^pip3?\s+install\b", None, 0.95, "pip-install"),
    (E::Python, Install, r"^(?:python3?|py)\s+-m\s+pip\s+install\b", None, 0.95, "python-m-pip-install"),
    (E::Python, Install, r"^(?:poetry|pipenv)\s+(?:install|sync)\b", None, 0.9, "poetry-install"),
    (E::Python, Install, r"^(?:poetry|pipenv|uv)\s+add\b", None, 0.85, "poetry-add"),
    (E::Python, Install, r"^uv\s+(?:sync|pip\s+install)\b", None, 0.9, "uv-install"),
    (E::Python, Install, r"^conda\s+(?:install|env\s+create|create)\b", None, 0.85, "conda-install"),
    (E::Python, Install, r"^(?:python3?|py)\s+setup\.py\s+(?:install|develop)\b", None, 0.8, "setup-py-install"),
    (E::Python, Build, r"^(?:python3?|py)\s+-m\s+build\b", None, 0.9, "python-m-build"),
    (E::Python, Build, r"^(?:python3?|py)\s+setup\.py\s+(?:build|sdist|bdist_wheel)\b", None, 0.85, "setup-py-build"),
    (E::Python, Build, r"^(?:poetry|uv)\s+build\b", None, 0.9, "poetry-build"),
    (E::Python, Build, r"^(?:python3?|py)\s+-m\s+\S+", Some(r"^(?:python3?|py)\s+-m\s+(?:pip|pytest|unittest|tox)\b"), 0.7, "python-m-module"),
    (E::Python, Test, r"^pytest\b", None, 0.9, "pytest"),
    (E::Python, Test, r"^(?:python3?|py)\s+-m\s+(?:pytest|unittest)\b", None, 0.9, "python-m-pytest"),
    (E::Python, Test, r"^tox\b", None, 0.85, "tox"),
    (E::Python, Test, r"^(?:python3?|py)\s+setup\.py\s+test\b", None, 0.85, "setup-py-test"),
    (E::Python, Test, r"^(?:poetry|pipenv|uv)\s+run\s+(?:pytest|tox|python3?\s+-m\s+(?:pytest|unittest))\b", None, 0.85, "poetry-run-tests"),
    (E::Python, Other, r"^(?:poetry|pipenv|uv)\s+run\b", None, 0.7, "poetry-run"),
    (E::Python, Other, r"^(?:python3?|py)\s+\S+", None, 0.6, "python-script"),
    // cargo
    (E::Cargo, Install, r"^cargo\s+(?:fetch|add|install)\b", None, 0.9, "cargo-fetch"),
    (E::Cargo, Install, r"^rustup\s+(?:toolchain\s+install|component\s+add|target\s+add|install)\b", None, 0.85, "rustup-install"),
    (E::Cargo, Build, r"^cargo\s+(?:build|check|b|c)(?:\s|$)", None, 0.9, "cargo-build"),
    (E::Cargo, Build, r"^cargo\s+doc\b", None, 0.8, "cargo-doc"),
    (E::Cargo, Build, r"^rustc\s+\S+", None, 0.8, "rustc"),
    (E::Cargo, Test, r"^cargo\s+(?:test|t|bench|nextest\s+run)(?:\s|$)", None, 0.9, "cargo-test"),
    (E::Cargo, Other, r"^cargo\s+\S+", None, 0.7, "cargo-subcommand"),
    (E::Cargo, Other, r"^rustup\s+\S+", None, 0.6, "rustup"),
    // go
    (E::Go, Install, r"^go\s+(?:get|mod\s+(?:download|tidy|vendor))\b", None, 0.9, "go-get"),
    (E::Go, Build, r"^go\s+build\b", None, 0.9, "go-build"),
    (E::Go, Build, r"^go\s+install\b", None, 0.9, "go-install-local-binary"),
    (E::Go, Build, r"^go\s+generate\b", None, 0.85, "go-generate"),
    (E::Go, Test, r"^go\s+test\b", None, 0.95, "go-test"),
    (E::Go, Other, r"^go\s+\S+", None, 0.7, "go-subcommand"),
    // maven
    (E::Maven, Install, r"^(?:\./)?mvnw?(?:\.cmd)?\s+(?:\S+\s+)*dependency:(?:resolve|go-offline|copy-dependencies)\b", None, 0.85, "mvn-dependency"),
    (E::Maven, Build, r"^(?:\./)?mvnw?(?:\.cmd)?\s+(?:\S+\s+)*(?:package|compile|install|deploy)\b", None, 0.9, "mvn-package"),
    (E::Maven, Test, r"^(?:\./)?mvnw?(?:\.cmd)?\s+(?:\S+\s+)*(?:test|verify)\b", None, 0.9, "mvn-test"),
    (E::Maven, Other, r"^(?:\./)?mvnw?(?:\.cmd)?\b", None, 0.6, "mvn-goal"),
    // gradle
    (E::Gradle, Install, r"^(?:\./)?gradlew?(?:\.bat)?\s+(?:\S+\s+)*(?:dependencies|--refresh-dependencies)\b", Some(r"(?:\s|:)(?:build|assemble|jar|bootJar|installDist|test|check|connectedCheck)(?:\s|$)"), 0.8, "gradle-dependencies"),
    (E::Gradle, Build, r"^(?:\./)?gradlew?(?:\.bat)?\s+(?:\S+\s+)*(?:build|assemble|jar|bootJar|installDist)\b", None, 0.9, "gradle-build"),
    (E::Gradle, Test, r"^(?:\./)?gradlew?(?:\.bat)?\s+(?:\S+\s+)*(?:test|check|connectedCheck)\b", None, 0.9, "gradle-test"),
    (E::Gradle, Other, r"^(?:\./)?gradlew?(?:\.bat)?\b", None, 0.6, "gradle-task"),
    // dotnet
    (E::Dotnet, Install, r"^dotnet\s+(?:restore|add\s+(?:\S+\s+)?package|tool\s+(?:install|restore))\b", None, 0.9, "dotnet-restore"),
    (E::Dotnet, Build, r"^dotnet\s+(?:build|publish|pack)\b", None, 0.9, "dotnet-build"),
    (E::Dotnet, Test, r"^dotnet\s+test\b", None, 0.95, "dotnet-test"),
    (E::Dotnet, Other, r"^dotnet\s+\S+", None, 0.7, "dotnet-subcommand"),
    // ruby
    (E::Bundle, Install, r"^bundle(?:\s+install)?(?:\s+--?\S+)*\s*$", Some(INFO_FLAG_GUARD), 0.9, "bundle-install"),
    (E::Bundle, Install, r"^(?:gem\s+install|bundle\s+add)\b", None, 0.9, "gem-install"),
    (E::Bundle, Build, r"^gem\s+build\b", None, 0.85, "gem-build"),
    (E::Bundle, Build, r"^(?:bundle\s+exec\s+)?rake\s+(?:build|compile)\b", None, 0.8, "rake-build"),
    (E::Bundle, Test, r"^(?:bundle\s+exec\s+)?(?:rspec|rake\s+(?:test|spec)|rails\s+test)\b", None, 0.9, "rspec"),
    (E::Bundle, Other, r"^(?:bundle|rake|rails|ruby|gem)\b", None, 0.6, "ruby-exec"),
    // php
    (E::Composer, Install, r"^composer\s+(?:install|require|update)\b", None, 0.95, "composer-install"),
    (E::Composer, Test, r"^(?:composer\s+test|(?:\./)?vendor/bin/(?:phpunit|pest)|phpunit)\b", None, 0.9, "phpunit"),
    (E::Composer, Other, r"^(?:composer|php)\s+\S+", None, 0.6, "php-exec"),
    // elixir
    (E::Mix, Install, r"^mix\s+deps\.get\b", None, 0.9, "mix-deps-get"),
    (E::Mix, Build, r"^mix\s+(?:compile|release|escript\.build|deps\.compile)\b", None, 0.9, "mix-compile"),
    (E::Mix, Test, r"^mix\s+test\b", None, 0.95, "mix-test"),
    (E::Mix, Other, r"^mix\b", None, 0.6, "mix-task"),
    // scala
    (E::Sbt, Install, r"^sbt\s+update\b", None, 0.85, "sbt-update"),
    (E::Sbt, Build, r"^sbt\s+(?:\S+\s+)*(?:compile|package|assembly)\b", None, 0.9, "sbt-compile"),
    (E::Sbt, Test, r"^sbt\s+(?:\S+\s+)*test\b", None, 0.9, "sbt-test"),
    (E::Sbt, Other, r"^sbt\b", None, 0.6, "sbt-shell"),
    // clojure
    (E::Lein, Install, r"^lein\s+deps\b", None, 0.9, "lein-deps"),
    (E::Lein, Build, r"^lein\s+(?:compile|uberjar|jar)\b", None, 0.9, "lein-compile"),
    (E::Lein, Test, r"^lein\s+test\b", None, 0.95, "lein-test"),
    (E::Lein, Other, r"^lein\b", None, 0.6, "lein-task"),
    // ant
    (E::Ant, Build, r"^ant\s+(?:build|compile|jar|dist)\b", None, 0.85, "ant-build"),
    (E::Ant, Build, r"^ant\s*$", None, 0.75, "ant-default"),
    (E::Ant, Test, r"^ant\s+(?:test|junit)\b", None, 0.9, "ant-test"),
    (E::Ant, Other, r"^ant\b", None, 0.6, "ant-target"),
    // make
    (E::Make, Build, r"^g?make\s*$", None, 0.75, "make-default"),
    (E::Make, Build, r"^g?make\s+(?:-\S+\s+)*(?:all|build|install|release|-j\s*\d*)(?:\s|$)", None, 0.85, "make-build"),
    (E::Make, Test, r"^g?make\s+(?:-\S+\s+)*(?:test|tests|check)\b", None, 0.9, "make-test"),
    (E::Make, Other, r"^g?make\s+\S+", None, 0.6, "make-target"),
    // cmake
    (E::Cmake, Build, r"^cmake\b", None, 0.85, "cmake"),
    (E::Cmake, Test, r"^ctest\b", None, 0.9, "ctest"),
    // docker
    (E::Docker, Build, r"^(?:docker|podman)\s+(?:image\s+)?build\b", None, 0.85, "docker-build"),
    (E::Docker, Build, r"^docker(?:-|\s+)compose\s+build\b", None, 0.85, "compose-build"),
    (E::Docker, Other, r"^(?:docker|podman|docker-compose)\b", None, 0.6, "docker-exec"),
    // scripts
    (E::Script, Install, r"^(?:(?:ba|z)?sh\s+)?\S*(?:install|setup|bootstrap|deps)\S*\.(?:sh|ps1|bat|exe)\b", None, 0.6, "install-script"),
    (E::Script, Build, r"^(?:(?:ba|z)?sh\s+)?(?:\./)?(?:configure\b|\S*(?:build|compile)\S*)", None, 0.65, "build-script"),
    (E::Script, Test, r"^(?:(?:ba|z)?sh\s+)?\S*test\S*", None, 0.6, "test-script"),
    (E::Script, Other, r"^\S+", None, 0.5, "script"),
];
