//! Dependencies named by install commands.
//!
//! Only install-category commands are read. Flags are skipped, flags that
//! take a value consume it, and `-r <file>` records a requirement file.
//! `name@version` and `name==version` specs are split.

use std::collections::HashSet;

use doc_commands_core::{Command, CommandInfo, Dependency, DependencyInfo};

use crate::extractor::split_invocation;

/// Confidence when at least one package was found.
pub const PACKAGES_CONFIDENCE: f64 = 0.9;

/// Confidence when only requirement files were found.
pub const REQUIREMENT_FILES_CONFIDENCE: f64 = 0.6;

/// Confidence when install commands named nothing usable.
pub const NOTHING_FOUND_CONFIDENCE: f64 = 0.3;

/// Flags whose next token is a value, not a package.
const VALUE_FLAGS: &[&str] = &[
    "-c", "--constraint", "-i", "--index-url", "--extra-index-url", "-t", "--target",
    "--registry", "--source", "--framework", "--prefix", "--path", "--git",
    "--branch", "--tag", "--rev", "--features", "-F",
];

/// Package-manager invocations that add dependencies, as leading words.
///
/// The word list must match the command's leading tokens exactly; the
/// ecosystem names the registry the packages come from.
const INSTALLERS: &[(&[&str], &str)] = &[
    (&["npm", "install"], "npm"),
    (&["npm", "i"], "npm"),
    (&["npm", "add"], "npm"),
    (&["yarn", "add"], "npm"),
    (&["yarn", "global", "add"], "npm"),
    (&["pnpm", "add"], "npm"),
    (&["pnpm", "install"], "npm"),
    (&["pnpm", "i"], "npm"),
    (&["bun", "add"], "npm"),
    (&["bun", "install"], "npm"),
    (&["pip", "install"], "pypi"),
    (&["pip3", "install"], "pypi"),
    (&["python", "-m", "pip", "install"], "pypi"),
    (&["python3", "-m", "pip", "install"], "pypi"),
    (&["uv", "pip", "install"], "pypi"),
    (&["uv", "add"], "pypi"),
    (&["poetry", "add"], "pypi"),
    (&["pipenv", "install"], "pypi"),
    (&["conda", "install"], "conda"),
    (&["cargo", "add"], "crates.io"),
    (&["cargo", "install"], "crates.io"),
    (&["go", "get"], "go"),
    (&["gem", "install"], "rubygems"),
    (&["bundle", "add"], "rubygems"),
    (&["composer", "require"], "packagist"),
    (&["dotnet", "add", "package"], "nuget"),
];

/// Collects dependencies from `commands` with the stage confidence.
///
/// ```
/// use doc_commands_analyzer::dependencies::extract_dependencies;
/// use doc_commands_core::{Command, CommandCategory, CommandInfo, SourceRange};
///
/// let mut info = CommandInfo::default();
/// info.push(Command::new("npm install express@4.18.2", CommandCategory::Install, 0.95, SourceRange::single_line(3, 1, 26)));
///
/// let (deps, confidence) = extract_dependencies(&info);
/// assert_eq!(deps.packages[0].name, "express");
/// assert_eq!(deps.packages[0].version.as_deref(), Some("4.18.2"));
/// assert_eq!(confidence, 0.9);
/// ```
pub fn extract_dependencies(commands: &CommandInfo) -> (DependencyInfo, f64) {
    let mut info = DependencyInfo::default();
    let mut seen_packages = HashSet::new();
    let mut seen_files = HashSet::new();

    for command in &commands.install {
        let Some((ecosystem, args)) = installer_args(command) else {
            continue;
        };
        for spec in parse_args(&args, ecosystem) {
            match spec {
                Spec::Package { name, version } => {
                    if seen_packages.insert((name.clone(), ecosystem)) {
                        info.packages.push(Dependency {
                            name,
                            version,
                            ecosystem: ecosystem.to_string(),
                            source_command: command.text().to_string(),
                        });
                    }
                }
                Spec::RequirementFile(file) => {
                    if seen_files.insert(file.clone()) {
                        info.requirement_files.push(file);
                    }
                }
            }
        }
    }

    let confidence = if !info.packages.is_empty() {
        PACKAGES_CONFIDENCE
    } else if !info.requirement_files.is_empty() {
        REQUIREMENT_FILES_CONFIDENCE
    } else {
        NOTHING_FOUND_CONFIDENCE
    };
    (info, confidence)
}

#[derive(Debug, PartialEq, Eq)]
enum Spec {
    Package { name: String, version: Option<String> },
    RequirementFile(String),
}

fn installer_args(command: &Command) -> Option<(&'static str, Vec<&str>)> {
    let body = split_invocation(command.text()).body;
    let tokens: Vec<&str> = body.split_whitespace().collect();
    INSTALLERS.iter().find_map(|(prefix, ecosystem)| {
        let matches = tokens.len() >= prefix.len()
            && prefix.iter().zip(&tokens).all(|(want, got)| want == got);
        matches.then(|| (*ecosystem, tokens[prefix.len()..].to_vec()))
    })
}

fn parse_args(args: &[&str], ecosystem: &str) -> Vec<Spec> {
    let mut specs = Vec::new();
    let mut iter = args.iter().map(|arg| arg.trim_matches(|ch: char| ch == '"' || ch == '\''));

    while let Some(arg) = iter.next() {
        if let Some(file) = arg.strip_prefix("--requirement=") {
            specs.push(Spec::RequirementFile(file.to_string()));
            continue;
        }
        match arg {
            "-r" | "--requirement" => {
                if let Some(file) = iter.next() {
                    specs.push(Spec::RequirementFile(file.to_string()));
                }
            }
            "-e" | "--editable" => {
                iter.next();
            }
            "--version" | "--vers" => attach_version(&mut specs, iter.next()),
            "-v" if ecosystem == "rubygems" => attach_version(&mut specs, iter.next()),
            flag if VALUE_FLAGS.contains(&flag) => {
                iter.next();
            }
            flag if flag.starts_with('-') => {}
            _ if is_local_path(arg) => {}
            _ => specs.push(split_spec(arg, ecosystem)),
        }
    }
    specs
}

/// A version flag applies to the package named just before it.
fn attach_version(specs: &mut [Spec], version: Option<&str>) {
    if let (Some(version), Some(Spec::Package { version: slot, .. })) = (version, specs.last_mut()) {
        *slot = Some(version.to_string());
    }
}

fn is_local_path(arg: &str) -> bool {
    arg.is_empty()
        || arg.starts_with('.')
        || arg.starts_with('/')
        || arg.starts_with('~')
        || arg.contains("://")
        || arg.ends_with(".whl")
        || arg.ends_with(".tar.gz")
}

fn split_spec(arg: &str, ecosystem: &str) -> Spec {
    let (name, version) = if ecosystem == "pypi" || ecosystem == "conda" {
        split_python_spec(arg)
    } else {
        // Scoped npm names start with '@', so only a later '@' splits.
        match arg.rfind('@') {
            Some(idx) if idx > 0 => (&arg[..idx], Some(&arg[idx + 1..])),
            _ => (arg, None),
        }
    };
    Spec::Package {
        name: name.to_string(),
        version: version.filter(|v| !v.is_empty()).map(str::to_string),
    }
}

fn split_python_spec(arg: &str) -> (&str, Option<&str>) {
    let Some(idx) = arg.find(['=', '<', '>', '~', '!']) else {
        return (arg, None);
    };
    let (name, rest) = arg.split_at(idx);
    let version = rest.strip_prefix("==").unwrap_or(rest);
    let version = version.strip_prefix('=').unwrap_or(version);
    (name, Some(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_commands_core::{CommandCategory, SourceRange};

    fn info(commands: &[&str]) -> CommandInfo {
        let mut info = CommandInfo::default();
        for (idx, text) in commands.iter().enumerate() {
            info.push(Command::new(*text, CommandCategory::Install, 0.9, SourceRange::single_line(idx + 1, 1, text.len())));
        }
        info
    }

    fn names(deps: &DependencyInfo) -> Vec<(&str, Option<&str>)> {
        deps.packages
            .iter()
            .map(|d| (d.name.as_str(), d.version.as_deref()))
            .collect()
    }

    #[test]
    fn test_pip_specs_and_requirement_files() {
        let (deps, confidence) = extract_dependencies(&info(&[
            "pip install -r requirements-dev.txt flask==3.0.0 'requests>=2' -e .",
        ]));
        assert_eq!(names(&deps), vec![("flask", Some("3.0.0")), ("requests", Some(">=2"))]);
        assert_eq!(deps.requirement_files, vec!["requirements-dev.txt"]);
        assert_eq!(deps.packages[0].ecosystem, "pypi");
        assert_eq!(confidence, PACKAGES_CONFIDENCE);
    }

    #[test]
    fn test_scoped_npm_and_go_versions() {
        let (deps, _) = extract_dependencies(&info(&[
            "npm install --save-dev @types/node@20 typescript",
            "go get github.com/pkg/errors@v0.9.1",
        ]));
        assert_eq!(
            names(&deps),
            vec![
                ("@types/node", Some("20")),
                ("typescript", None),
                ("github.com/pkg/errors", Some("v0.9.1")),
            ]
        );
    }

    #[test]
    fn test_dotnet_version_flag_attaches_to_package() {
        let (deps, _) = extract_dependencies(&info(&["dotnet add package Serilog --version 3.1.1"]));
        assert_eq!(names(&deps), vec![("Serilog", Some("3.1.1"))]);
        assert_eq!(deps.packages[0].ecosystem, "nuget");
    }

    #[test]
    fn test_requirement_files_only_and_nothing_found() {
        let (deps, confidence) = extract_dependencies(&info(&["pip install -r requirements.txt"]));
        assert!(deps.packages.is_empty());
        assert_eq!(confidence, REQUIREMENT_FILES_CONFIDENCE);

        let (deps, confidence) = extract_dependencies(&info(&["npm install", "npm ci"]));
        assert_eq!(deps, DependencyInfo::default());
        assert_eq!(confidence, NOTHING_FOUND_CONFIDENCE);
    }

    #[test]
    fn test_duplicates_keep_first_source() {
        let (deps, _) = extract_dependencies(&info(&["cargo add serde", "cargo add serde --features derive"]));
        assert_eq!(deps.packages.len(), 1);
        assert_eq!(deps.packages[0].source_command, "cargo add serde");
    }
}
