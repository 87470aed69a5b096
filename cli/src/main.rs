use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use doc_commands_analyzer::extractor::{Ecosystem, PatternTable};
use doc_commands_analyzer::output::{OutputFormat, format_result};
use doc_commands_analyzer::{Pipeline, PipelineConfig, PipelineSettings};
use doc_commands_core::AnalysisResult;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
            CliOutputFormat::Markdown => Self::Markdown,
            CliOutputFormat::Table => Self::Table,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "doc-commands")]
#[command(about = "Extract install, build and test commands from README files")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a markdown file.
    AnalyzeFile(AnalyzeFileArgs),
    /// Analyze markdown read from stdin.
    AnalyzeStdin(AnalyzeArgs),
    /// Print the command classification table.
    Patterns(PatternsArgs),
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Pipeline settings file (YAML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format (default: json).
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Pipeline deadline in milliseconds; overrides the config file.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Language of the enclosing project; overrides the config file.
    #[arg(long)]
    language: Option<String>,
}

#[derive(Debug, Args)]
struct AnalyzeFileArgs {
    /// Markdown file to analyze.
    #[arg(long)]
    input: PathBuf,
    #[command(flatten)]
    analyze: AnalyzeArgs,
}

#[derive(Debug, Args)]
struct PatternsArgs {
    /// Only show rules for this ecosystem (e.g. npm, cargo, pip).
    #[arg(long)]
    ecosystem: Option<String>,
    /// Additional rules from a settings file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::AnalyzeFile(args) => run_analyze_file(args),
        Command::AnalyzeStdin(args) => run_analyze_stdin(args),
        Command::Patterns(args) => run_patterns(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `-v` flags pick the level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

fn run_analyze_file(args: AnalyzeFileArgs) -> Result<(), String> {
    let text = fs::read_to_string(&args.input)
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;
    run_analyze(&text, args.analyze)
}

fn run_analyze_stdin(args: AnalyzeArgs) -> Result<(), String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;
    run_analyze(&text, args)
}

fn run_analyze(text: &str, args: AnalyzeArgs) -> Result<(), String> {
    let mut settings = load_settings(args.config.as_ref())?;
    if args.timeout_ms.is_some() {
        settings.timeout_ms = args.timeout_ms;
    }
    if args.language.is_some() {
        settings.parent_language = args.language;
    }
    debug!(?settings, "Resolved pipeline settings");

    let result = Pipeline::new(PipelineConfig::new(settings)).execute(text);
    report_issues(&result);

    let rendered = format_result(&result, args.format.into())?;
    println!("{}", rendered.trim_end());

    if result.success {
        Ok(())
    } else {
        Err("analysis failed".to_string())
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<PipelineSettings, String> {
    match path {
        Some(path) => PipelineSettings::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display())),
        None => Ok(PipelineSettings::default()),
    }
}

/// Errors and warnings go to stderr so stdout stays machine-readable.
fn report_issues(result: &AnalysisResult) {
    for issue in &result.errors {
        eprintln!("error: {issue}");
    }
    for issue in &result.warnings {
        eprintln!("warning: {issue}");
    }
}

fn run_patterns(args: PatternsArgs) -> Result<(), String> {
    let settings = load_settings(args.config.as_ref())?;
    let table = settings.pattern_table().map_err(|err| err.to_string())?;
    let filter = args
        .ecosystem
        .as_deref()
        .map(|name| name.parse::<Ecosystem>().map_err(|err| err.to_string()))
        .transpose()?;

    print!("{}", render_patterns(&table, filter));
    Ok(())
}

fn render_patterns(table: &PatternTable, filter: Option<Ecosystem>) -> String {
    let mut out = String::new();
    for entry in table.ecosystems() {
        if filter.is_some_and(|eco| eco != entry.ecosystem) {
            continue;
        }
        out.push_str(&format!(
            "{} ({}) tools: {}\n",
            entry.ecosystem,
            entry.language.unwrap_or("-"),
            entry.tools.join(", ")
        ));
        for rule in &entry.rules {
            out.push_str(&format!(
                "  {:<8} {:.2}  {:<28} {}\n",
                rule.category.as_str(),
                rule.confidence,
                rule.label,
                rule.pattern.as_str()
            ));
        }
    }
    out
}
