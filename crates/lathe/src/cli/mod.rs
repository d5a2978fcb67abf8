//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use lathe_core::config::resolve_declaration_path;
use lathe_core::{load_config_or_default, Config};
use lathe_tasks::declaration::is_valid_variable_name;
use lathe_tasks::{DeclarationParser, TaskGraph};

use commands::{
    CheckCommand, CompletionsCommand, InitCommand, ListCommand, RunCommand, ShellType,
};

/// Lathe - declarative, Makefile-style task runner
#[derive(Debug, Parser)]
#[command(name = "lathe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Targets to run, or NAME=VALUE variable overrides
    #[arg(value_name = "TARGET|NAME=VALUE")]
    pub args: Vec<String>,

    /// Declaration file (default: Lathefile, Makefile, makefile)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long)]
    pub directory: Option<PathBuf>,

    /// Print the commands that would run without running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// List declared targets
    #[arg(short, long, conflicts_with_all = ["check", "dry_run"])]
    pub list: bool,

    /// Validate the declaration without running anything
    #[arg(long, conflicts_with = "dry_run")]
    pub check: bool,

    /// Write a starter lathe.toml into the working directory
    #[arg(long, conflicts_with_all = ["list", "check", "dry_run"])]
    pub init: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<ShellType>,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        if let Some(shell) = self.completions {
            return CompletionsCommand { shell }.execute();
        }

        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("Cannot change to directory {}", dir.display()))?;
        }

        if self.init {
            return InitCommand.execute(&self);
        }

        let (targets, overrides) = split_overrides(&self.args);
        let session = Session::load(&self, overrides)?;

        if self.list {
            ListCommand.execute(&self, &session)
        } else if self.check {
            CheckCommand.execute(&self, &session)
        } else {
            RunCommand { targets }.execute(&self, &session)
        }
    }

    /// Whether human-readable progress should be printed
    pub fn prints_text(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Text
    }
}

/// Configuration and parsed declaration for one invocation
#[derive(Debug)]
pub struct Session {
    pub root: PathBuf,
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub declaration_path: PathBuf,
    pub graph: TaskGraph,
}

impl Session {
    /// Load config, locate the declaration and parse it
    pub fn load(cli: &Cli, overrides: BTreeMap<String, String>) -> anyhow::Result<Self> {
        let root = std::env::current_dir()?;
        let (config, config_path) = load_config_or_default(&root)?;
        let declaration_path = resolve_declaration_path(
            &root,
            cli.file.as_deref(),
            &config,
            config_path.as_deref(),
        )?;

        debug!(overrides = overrides.len(), "parsing declaration");
        let graph = DeclarationParser::new()
            .with_overrides(overrides)
            .with_defaults(config.variables.clone())
            .parse_file(&declaration_path)
            .with_context(|| format!("Failed to load {}", declaration_path.display()))?;

        info!(
            path = %declaration_path.display(),
            targets = graph.len(),
            "session ready"
        );

        Ok(Self {
            root,
            config,
            config_path,
            declaration_path,
            graph,
        })
    }
}

/// Separate `NAME=VALUE` overrides from target names
fn split_overrides(args: &[String]) -> (Vec<String>, BTreeMap<String, String>) {
    let mut targets = Vec::new();
    let mut overrides = BTreeMap::new();

    for arg in args {
        match arg.split_once('=') {
            Some((name, value)) if is_valid_variable_name(name) => {
                overrides.insert(name.to_string(), value.to_string());
            }
            _ => targets.push(arg.clone()),
        }
    }

    (targets, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_split_overrides() {
        let (targets, overrides) = split_overrides(&args(&["test", "PYTHON=pypy3", "lint", "EMPTY="]));

        assert_eq!(targets, vec!["test", "lint"]);
        assert_eq!(overrides.get("PYTHON"), Some(&"pypy3".to_string()));
        assert_eq!(overrides.get("EMPTY"), Some(&String::new()));
    }

    #[test]
    fn test_split_overrides_value_with_equals() {
        let (_, overrides) = split_overrides(&args(&["OPTS=--level=3"]));
        assert_eq!(overrides.get("OPTS"), Some(&"--level=3".to_string()));
    }

    #[test]
    fn test_split_overrides_invalid_name_is_target() {
        let (targets, overrides) = split_overrides(&args(&["a.b=c"]));
        assert_eq!(targets, vec!["a.b=c"]);
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["lathe", "-n", "-f", "Build.mk", "-C", "sub", "docs"]).unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.file, Some(PathBuf::from("Build.mk")));
        assert_eq!(cli.directory, Some(PathBuf::from("sub")));
        assert_eq!(cli.args, vec!["docs"]);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["lathe", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_json_format() {
        let cli = Cli::try_parse_from(["lathe", "--list", "--format", "json"]).unwrap();
        assert!(cli.list);
        assert!(!cli.prints_text());
    }
}
