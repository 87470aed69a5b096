//! Basic README analysis example.
//!
//! Runs the default pipeline over an inline README and prints the commands
//! it found, grouped by category, with their language attribution.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p doc-commands-demos --example analyze_readme
//! ```

use doc_commands_analyzer::analyze_readme;
use doc_commands_core::CommandCategory;

fn main() {
    let readme = r#"# weather-cli

[![CI](https://img.shields.io/badge/ci-passing-green.svg)](https://ci.example.com)

Fetches forecasts from the command line.

## Installation

Requires Python 3.10 or newer. Dependencies are listed in `pyproject.toml`.

```console
$ pip install -r requirements.txt
$ pip install weather-cli==2.1.0
```

## Development

```bash
python -m build
pytest -q
```

Set `WEATHER_API_KEY=changeme` before running the tests.

## License

MIT
"#;

    let result = analyze_readme(readme);
    if !result.success {
        for issue in &result.errors {
            eprintln!("error: {issue}");
        }
        std::process::exit(1);
    }

    let Some(data) = &result.data else {
        return;
    };

    if let Some(meta) = &data.metadata {
        println!("Project: {}", meta.name.as_deref().unwrap_or("?"));
        println!("License: {}", meta.license.as_deref().unwrap_or("?"));
        println!();
    }

    if let Some(commands) = &data.commands {
        for category in CommandCategory::PRIORITY {
            let list = commands.get(category);
            if list.is_empty() {
                continue;
            }
            println!("{category}:");
            for cmd in list {
                println!(
                    "  {:<40} {:<8} conf={:.2} (match {:.2})",
                    cmd.text(),
                    cmd.effective_language().unwrap_or("-"),
                    cmd.confidence(),
                    cmd.match_confidence(),
                );
            }
        }
        println!();
    }

    if let Some(deps) = &data.dependencies {
        for dep in &deps.packages {
            println!(
                "dependency: {} {} ({})",
                dep.name,
                dep.version.as_deref().unwrap_or("*"),
                dep.ecosystem
            );
        }
        for file in &deps.requirement_files {
            println!("requirements: {file}");
        }
    }

    if let Some(vars) = &data.env_vars {
        for var in vars {
            println!("env: {} (line {})", var.name, var.line);
        }
    }

    println!();
    println!("Overall confidence: {:.2}", data.overall_confidence);
    for warning in &result.warnings {
        println!("warning: {warning}");
    }
}
