//! Target types and definitions

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single command line of a target's recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    /// Shell text after placeholder substitution
    pub text: String,
    /// Do not echo the command before running it (`@` prefix)
    #[serde(default)]
    pub silent: bool,
    /// Keep going when the command exits non-zero (`-` prefix)
    #[serde(default)]
    pub ignore_errors: bool,
}

impl CommandLine {
    /// Create a plain command
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            silent: false,
            ignore_errors: false,
        }
    }

    /// Split the `@` / `-` modifiers off a raw recipe line.
    ///
    /// Modifiers may be combined in any order and separated by whitespace.
    /// Returns the modifiers applied to an empty command plus the remaining text.
    pub fn split_modifiers(raw: &str) -> (Self, &str) {
        let mut line = Self::new(String::new());
        let mut rest = raw.trim_start();

        loop {
            if let Some(stripped) = rest.strip_prefix('@') {
                line.silent = true;
                rest = stripped.trim_start();
            } else if let Some(stripped) = rest.strip_prefix('-') {
                line.ignore_errors = true;
                rest = stripped.trim_start();
            } else {
                break;
            }
        }

        (line, rest)
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A named unit of work in the task graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Unique target name
    pub name: String,

    /// Targets that must run first, in declared order
    #[serde(default)]
    pub prerequisites: Vec<String>,

    /// Commands run in order when the target executes
    #[serde(default)]
    pub commands: Vec<CommandLine>,

    /// Always runs; not tied to a file of the same name
    #[serde(default)]
    pub phony: bool,

    /// Environment overrides applied to every command of this target
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Declaration line of the header (0 when built in code)
    #[serde(default)]
    pub line: usize,
}

impl Target {
    /// Create a new target
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prerequisites: Vec::new(),
            commands: Vec::new(),
            phony: false,
            env: BTreeMap::new(),
            line: 0,
        }
    }

    /// Add a prerequisite
    pub fn with_prerequisite(mut self, name: impl Into<String>) -> Self {
        self.prerequisites.push(name.into());
        self
    }

    /// Append a command
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(CommandLine::new(command));
        self
    }

    /// Append a command with modifiers already applied
    pub fn with_command_line(mut self, command: CommandLine) -> Self {
        self.commands.push(command);
        self
    }

    /// Mark as phony
    pub fn with_phony(mut self, phony: bool) -> Self {
        self.phony = phony;
        self
    }

    /// Add an environment override
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Whether this target has nothing to run
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_builder() {
        let target = Target::new("test")
            .with_prerequisite("install")
            .with_command("pytest")
            .with_phony(true)
            .with_env("PYTHONHASHSEED", "0");

        assert_eq!(target.name, "test");
        assert_eq!(target.prerequisites, vec!["install"]);
        assert_eq!(target.commands, vec![CommandLine::new("pytest")]);
        assert!(target.phony);
        assert_eq!(target.env.get("PYTHONHASHSEED"), Some(&"0".to_string()));
    }

    #[test]
    fn test_split_modifiers_none() {
        let (line, rest) = CommandLine::split_modifiers("echo hi");
        assert!(!line.silent);
        assert!(!line.ignore_errors);
        assert_eq!(rest, "echo hi");
    }

    #[test]
    fn test_split_modifiers_combined() {
        let (line, rest) = CommandLine::split_modifiers("-@ rm -rf build");
        assert!(line.silent);
        assert!(line.ignore_errors);
        assert_eq!(rest, "rm -rf build");

        let (line, rest) = CommandLine::split_modifiers("@-rm -rf build");
        assert!(line.silent && line.ignore_errors);
        assert_eq!(rest, "rm -rf build");
    }

    #[test]
    fn test_empty_target() {
        assert!(Target::new("all").is_empty());
        assert!(!Target::new("all").with_command("true").is_empty());
    }
}
