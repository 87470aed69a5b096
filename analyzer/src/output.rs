//! Output formatting for analysis results.

use doc_commands_core::{AnalysisData, AnalysisResult, Command, CommandCategory, Issue};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// Formats an analysis result in the requested output format.
pub fn format_result(result: &AnalysisResult, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(result).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(result_to_markdown(result)),
        OutputFormat::Table => Ok(result_to_table(result)),
    }
}

fn result_to_markdown(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let title = result
        .data
        .as_ref()
        .and_then(|data| data.metadata.as_ref())
        .and_then(|meta| meta.name.as_deref())
        .unwrap_or("README analysis");
    out.push_str(&format!("# {title}\n\n"));
    out.push_str(&format!(
        "- **Success:** {}\n",
        if result.success { "yes" } else { "no" }
    ));
    out.push_str(&format!(
        "- **Confidence:** {:.0}%\n",
        result.overall_confidence() * 100.0
    ));

    if let Some(data) = &result.data {
        if let Some(meta) = &data.metadata {
            if let Some(desc) = &meta.description {
                out.push_str(&format!("- **Description:** {desc}\n"));
            }
            if let Some(license) = &meta.license {
                out.push_str(&format!("- **License:** {license}\n"));
            }
        }
        out.push('\n');
        markdown_commands(&mut out, data);
        markdown_languages(&mut out, data);
        markdown_dependencies(&mut out, data);
        markdown_env_vars(&mut out, data);
    } else {
        out.push('\n');
    }

    markdown_issues(&mut out, "Errors", &result.errors);
    markdown_issues(&mut out, "Warnings", &result.warnings);
    out
}

fn markdown_commands(out: &mut String, data: &AnalysisData) {
    let Some(commands) = &data.commands else {
        return;
    };
    for category in CommandCategory::PRIORITY {
        let list = commands.get(category);
        if list.is_empty() {
            continue;
        }
        out.push_str(&format!("## {} commands\n\n", capitalize(category.as_str())));
        out.push_str("| Command | Language | Confidence | Line |\n");
        out.push_str("|---------|----------|------------|------|\n");
        for cmd in list {
            out.push_str(&format!(
                "| `{}` | {} | {:.2} | {} |\n",
                cmd.text(),
                cmd.effective_language().unwrap_or("-"),
                cmd.confidence(),
                cmd.source_location().start_line,
            ));
        }
        out.push('\n');
    }
}

fn markdown_languages(out: &mut String, data: &AnalysisData) {
    let Some(languages) = data.languages.as_ref().filter(|l| !l.is_empty()) else {
        return;
    };
    out.push_str("## Languages\n\n");
    for ctx in languages {
        out.push_str(&format!(
            "- {} ({:.2}) lines {}-{}\n",
            ctx.language, ctx.confidence, ctx.source_range.start_line, ctx.source_range.end_line
        ));
    }
    out.push('\n');
}

fn markdown_dependencies(out: &mut String, data: &AnalysisData) {
    let Some(deps) = &data.dependencies else {
        return;
    };
    if deps.packages.is_empty() && deps.requirement_files.is_empty() {
        return;
    }
    out.push_str("## Dependencies\n\n");
    for dep in &deps.packages {
        match &dep.version {
            Some(version) => out.push_str(&format!("- `{}` {version} ({})\n", dep.name, dep.ecosystem)),
            None => out.push_str(&format!("- `{}` ({})\n", dep.name, dep.ecosystem)),
        }
    }
    for file in &deps.requirement_files {
        out.push_str(&format!("- requirements file `{file}`\n"));
    }
    out.push('\n');
}

fn markdown_env_vars(out: &mut String, data: &AnalysisData) {
    let Some(vars) = data.env_vars.as_ref().filter(|v| !v.is_empty()) else {
        return;
    };
    out.push_str("## Environment Variables\n\n");
    out.push_str("| Name | Default | Line |\n");
    out.push_str("|------|---------|------|\n");
    for var in vars {
        out.push_str(&format!(
            "| `{}` | {} | {} |\n",
            var.name,
            var.default_value.as_deref().unwrap_or("-"),
            var.line
        ));
    }
    out.push('\n');
}

fn markdown_issues(out: &mut String, heading: &str, issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    out.push_str(&format!("## {heading}\n\n"));
    for issue in issues {
        out.push_str(&format!("- {issue}\n"));
    }
    out.push('\n');
}

fn result_to_table(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let status = if result.success { "OK" } else { "FAIL" };
    out.push_str(&format!(
        "Status: {status}  conf={:.2}  errors={}  warnings={}\n",
        result.overall_confidence(),
        result.errors.len(),
        result.warnings.len()
    ));

    let Some(commands) = result.commands() else {
        return out;
    };
    let rows: Vec<&Command> = commands.in_document_order();
    if rows.is_empty() {
        return out;
    }

    let width = rows.iter().map(|c| c.text().len()).max().unwrap_or(7).max(7);
    out.push('\n');
    out.push_str(&format!(
        "{:<8} {:<width$}  {:<12} CONF\n",
        "CATEGORY", "COMMAND", "LANGUAGE"
    ));
    for cmd in rows {
        out.push_str(&format!(
            "{:<8} {:<width$}  {:<12} {:.2}\n",
            cmd.category().as_str(),
            cmd.text(),
            cmd.effective_language().unwrap_or("-"),
            cmd.confidence(),
        ));
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_commands_core::IssueKind;

    const README: &str = "# demo\n\nA small demo.\n\n## Install\n\n```bash\nnpm install\n```\n\n## Test\n\n```bash\nnpm test\n```\n\nSet `APP_PORT=3000` to change the port.\n";

    fn analyzed() -> AnalysisResult {
        crate::analyze_readme(README)
    }

    #[test]
    fn test_format_result_json() {
        let json = format_result(&analyzed(), OutputFormat::Json).unwrap();
        assert!(json.contains("\"success\": true"));
        assert!(json.contains("\"npm install\""));
    }

    #[test]
    fn test_format_result_yaml() {
        let yaml = format_result(&analyzed(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("success: true"));
    }

    #[test]
    fn test_format_result_markdown() {
        let md = format_result(&analyzed(), OutputFormat::Markdown).unwrap();
        assert!(md.contains("# demo"));
        assert!(md.contains("**Success:** yes"));
        assert!(md.contains("## Install commands"));
        assert!(md.contains("`npm install`"));
        assert!(md.contains("`APP_PORT`"));
    }

    #[test]
    fn test_format_result_markdown_with_failure() {
        let result = AnalysisResult::fatal(Issue::new("parse", IssueKind::ParseFailure, "bad input"));
        let md = format_result(&result, OutputFormat::Markdown).unwrap();
        assert!(md.contains("# README analysis"));
        assert!(md.contains("**Success:** no"));
        assert!(md.contains("## Errors"));
        assert!(md.contains("bad input"));
    }

    #[test]
    fn test_format_result_table() {
        let table = format_result(&analyzed(), OutputFormat::Table).unwrap();
        assert!(table.starts_with("Status: OK"));
        assert!(table.contains("install"));
        assert!(table.contains("npm test"));
    }

    #[test]
    fn test_format_result_table_failure() {
        let result = AnalysisResult::fatal(Issue::new("parse", IssueKind::ParseFailure, "bad input"));
        let table = format_result(&result, OutputFormat::Table).unwrap();
        assert!(table.contains("FAIL"));
        assert!(table.contains("errors=1"));
    }
}
