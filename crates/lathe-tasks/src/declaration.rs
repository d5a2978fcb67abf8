//! Declaration parser: Makefile-style text into a [`TaskGraph`]
//!
//! ```text
//! PYTHON := python3
//!
//! .PHONY: install test
//!
//! install:
//! 	$(PYTHON) -m pip install -e .
//!
//! test: install
//! 	@$(PYTHON) -m pytest
//!
//! test: PYTHONHASHSEED = 0
//! ```
//!
//! Headers are `name: prerequisites...`; indented lines after a header are its
//! commands. `.PHONY` and `.DEFAULT_GOAL` are reserved markers. Commands are
//! opaque apart from `$@`, `$<`, `$^`, `$$` and `$(NAME)` substitution.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::graph::TaskGraph;
use crate::target::{CommandLine, Target};

pub use lathe_core::config::validation::is_valid_variable_name;

/// Reserved marker listing phony targets
pub const PHONY_MARKER: &str = ".PHONY";

/// Reserved marker naming the default target
pub const DEFAULT_GOAL_MARKER: &str = ".DEFAULT_GOAL";

fn target_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_./+\-]+$").unwrap())
}

/// Whether `name` is usable as a target or prerequisite
pub fn is_valid_target_name(name: &str) -> bool {
    target_name_pattern().is_match(name)
}

/// Parse a declaration with no variable overrides
pub fn parse(source: &str) -> std::result::Result<TaskGraph, ParseError> {
    DeclarationParser::new().parse(source)
}

/// Declaration parser with caller-supplied variables
#[derive(Debug, Clone, Default)]
pub struct DeclarationParser {
    /// Always win over declaration assignments
    overrides: BTreeMap<String, String>,
    /// Lose to declaration assignments; `?=` keeps them
    defaults: BTreeMap<String, String>,
}

impl DeclarationParser {
    /// Create a parser with no variables
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables that take precedence over every declaration assignment
    pub fn with_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Variables defined before the first declaration line
    pub fn with_defaults(mut self, defaults: BTreeMap<String, String>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Read and parse a declaration file
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn parse_file(&self, path: &Path) -> Result<TaskGraph> {
        let source = std::fs::read_to_string(path)?;
        let graph = self.parse(&source)?;
        info!(targets = graph.len(), "declaration loaded");
        Ok(graph)
    }

    /// Parse declaration text
    pub fn parse(&self, source: &str) -> std::result::Result<TaskGraph, ParseError> {
        let mut state = ParseState::new(self);

        for line in logical_lines(source) {
            state.feed(line)?;
        }

        state.finish()
    }
}

/// A source line after continuation joining
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogicalLine {
    /// 1-based number of the first physical line
    number: usize,
    text: String,
    indented: bool,
}

fn logical_lines(source: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut physical = source.lines().enumerate().peekable();

    while let Some((idx, raw)) = physical.next() {
        let indented = raw.starts_with('\t') || raw.starts_with(' ');
        let mut text = if indented {
            raw.trim_start().to_string()
        } else {
            raw.to_string()
        };

        while text.ends_with('\\') {
            let Some((_, next)) = physical.next() else {
                break;
            };
            if indented {
                // The shell sees the backslash-newline and joins the lines itself.
                text.push('\n');
                text.push_str(next.strip_prefix('\t').unwrap_or(next));
            } else {
                text.pop();
                text.push(' ');
                text.push_str(next.trim());
            }
        }

        lines.push(LogicalLine {
            number: idx + 1,
            text,
            indented,
        });
    }

    lines
}

fn strip_comment(text: &str) -> &str {
    match text.find('#') {
        Some(idx) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssignOp {
    /// `=` and `:=`
    Set,
    /// `?=`
    Default,
    /// `+=`
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'t> {
    Assignment {
        name: &'t str,
        op: AssignOp,
        value: &'t str,
    },
    Rule {
        name: &'t str,
        rest: &'t str,
    },
}

fn classify(text: &str) -> std::result::Result<LineKind<'_>, ParseErrorKind> {
    match (text.find(':'), text.find('=')) {
        (Some(c), Some(e)) if e == c + 1 => Ok(LineKind::Assignment {
            name: text[..c].trim(),
            op: AssignOp::Set,
            value: text[e + 1..].trim(),
        }),
        (Some(c), Some(e)) if c < e => Ok(LineKind::Rule {
            name: text[..c].trim(),
            rest: &text[c + 1..],
        }),
        (_, Some(e)) => {
            let lhs = &text[..e];
            let (name, op) = if let Some(name) = lhs.strip_suffix('?') {
                (name, AssignOp::Default)
            } else if let Some(name) = lhs.strip_suffix('+') {
                (name, AssignOp::Append)
            } else {
                (lhs, AssignOp::Set)
            };
            Ok(LineKind::Assignment {
                name: name.trim(),
                op,
                value: text[e + 1..].trim(),
            })
        }
        (Some(c), None) => Ok(LineKind::Rule {
            name: text[..c].trim(),
            rest: &text[c + 1..],
        }),
        (None, None) => Err(ParseErrorKind::MissingSeparator),
    }
}

/// Values for `$@`, `$<` and `$^`
#[derive(Debug, Clone, Copy)]
struct Automatic<'a> {
    target: &'a str,
    prerequisites: &'a [String],
}

/// A target whose commands are expanded once the whole file is read
#[derive(Debug)]
struct PendingTarget {
    target: Target,
    commands: Vec<(usize, String)>,
}

#[derive(Debug)]
struct EnvOverride {
    line: usize,
    target: String,
    key: String,
    value: String,
}

struct ParseState<'p> {
    parser: &'p DeclarationParser,
    variables: BTreeMap<String, String>,
    targets: Vec<PendingTarget>,
    index: HashMap<String, usize>,
    current: Option<usize>,
    phony: Vec<(usize, String)>,
    env_overrides: Vec<EnvOverride>,
    default_goal: Option<String>,
}

impl<'p> ParseState<'p> {
    fn new(parser: &'p DeclarationParser) -> Self {
        Self {
            parser,
            variables: parser.defaults.clone(),
            targets: Vec::new(),
            index: HashMap::new(),
            current: None,
            phony: Vec::new(),
            env_overrides: Vec::new(),
            default_goal: None,
        }
    }

    fn feed(&mut self, line: LogicalLine) -> std::result::Result<(), ParseError> {
        if line.indented {
            return self.feed_command(line);
        }

        let text = strip_comment(&line.text).trim();
        if text.is_empty() {
            return Ok(());
        }

        let kind = classify(text).map_err(|kind| ParseError::new(line.number, kind))?;
        match kind {
            LineKind::Assignment { name, .. } if name == DEFAULT_GOAL_MARKER => {
                self.current = None;
                let value = &text[text.find('=').map_or(text.len(), |e| e + 1)..];
                self.default_goal_marker(line.number, value)
            }
            LineKind::Assignment { name, op, value } => {
                self.current = None;
                self.assign(line.number, name, op, value)
            }
            LineKind::Rule { name, rest } => self.rule(line.number, name, rest),
        }
    }

    fn feed_command(&mut self, line: LogicalLine) -> std::result::Result<(), ParseError> {
        if line.text.is_empty() || line.text.starts_with('#') {
            return Ok(());
        }

        match self.current {
            Some(idx) => {
                self.targets[idx].commands.push((line.number, line.text));
                Ok(())
            }
            None => Err(ParseError::new(
                line.number,
                ParseErrorKind::CommandOutsideTarget,
            )),
        }
    }

    fn assign(
        &mut self,
        line: usize,
        name: &str,
        op: AssignOp,
        value: &str,
    ) -> std::result::Result<(), ParseError> {
        if !is_valid_variable_name(name) {
            return Err(ParseError::new(
                line,
                ParseErrorKind::InvalidVariableName(name.to_string()),
            ));
        }

        if self.parser.overrides.contains_key(name) {
            debug!(variable = name, line, "assignment shadowed by override");
            return Ok(());
        }

        let value = self
            .expand(value, line, None)
            .map_err(|kind| ParseError::new(line, kind))?;

        match op {
            AssignOp::Set => {
                self.variables.insert(name.to_string(), value);
            }
            AssignOp::Default => {
                self.variables.entry(name.to_string()).or_insert(value);
            }
            AssignOp::Append => {
                let entry = self.variables.entry(name.to_string()).or_default();
                if !entry.is_empty() && !value.is_empty() {
                    entry.push(' ');
                }
                entry.push_str(&value);
            }
        }

        Ok(())
    }

    fn rule(&mut self, line: usize, name: &str, rest: &str) -> std::result::Result<(), ParseError> {
        self.current = None;

        let name = self
            .expand(name, line, None)
            .map_err(|kind| ParseError::new(line, kind))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::new(line, ParseErrorKind::EmptyTargetName));
        }

        match name {
            PHONY_MARKER => return self.phony_marker(line, rest),
            DEFAULT_GOAL_MARKER => return self.default_goal_marker(line, rest),
            _ => {}
        }

        if !is_valid_target_name(name) {
            return Err(ParseError::new(
                line,
                ParseErrorKind::InvalidTargetName(name.to_string()),
            ));
        }

        if let Some((key, value)) = rest.split_once('=') {
            return self.env_override(line, name, key, value);
        }

        let rest = self
            .expand(rest, line, None)
            .map_err(|kind| ParseError::new(line, kind).in_target(name))?;
        let mut target = Target::new(name);
        target.line = line;
        for prerequisite in rest.split_whitespace() {
            if !is_valid_target_name(prerequisite) {
                return Err(ParseError::new(
                    line,
                    ParseErrorKind::MalformedPrerequisite(prerequisite.to_string()),
                )
                .in_target(name));
            }
            target.prerequisites.push(prerequisite.to_string());
        }

        if let Some(&existing) = self.index.get(name) {
            return Err(ParseError::new(
                line,
                ParseErrorKind::DuplicateTarget {
                    name: name.to_string(),
                    first_line: self.targets[existing].target.line,
                },
            ));
        }

        debug!(target_name = name, line, prerequisites = target.prerequisites.len(), "target declared");
        self.index.insert(name.to_string(), self.targets.len());
        self.current = Some(self.targets.len());
        self.targets.push(PendingTarget {
            target,
            commands: Vec::new(),
        });
        Ok(())
    }

    fn marker_names(&self, line: usize, marker: &str, rest: &str) -> std::result::Result<Vec<String>, ParseError> {
        let expanded = self
            .expand(rest, line, None)
            .map_err(|kind| ParseError::new(line, kind))?;
        let names: Vec<String> = expanded.split_whitespace().map(str::to_string).collect();

        if names.is_empty() {
            return Err(ParseError::new(
                line,
                ParseErrorKind::EmptyMarker(marker.to_string()),
            ));
        }
        if let Some(bad) = names.iter().find(|n| !is_valid_target_name(n)) {
            return Err(ParseError::new(
                line,
                ParseErrorKind::InvalidTargetName(bad.clone()),
            ));
        }

        Ok(names)
    }

    fn phony_marker(&mut self, line: usize, rest: &str) -> std::result::Result<(), ParseError> {
        let names = self.marker_names(line, PHONY_MARKER, rest)?;
        self.phony.extend(names.into_iter().map(|n| (line, n)));
        Ok(())
    }

    fn default_goal_marker(&mut self, line: usize, rest: &str) -> std::result::Result<(), ParseError> {
        let mut names = self.marker_names(line, DEFAULT_GOAL_MARKER, rest)?;
        if names.len() != 1 {
            return Err(ParseError::new(
                line,
                ParseErrorKind::AmbiguousDefaultGoal(names.len()),
            ));
        }
        self.default_goal = names.pop();
        Ok(())
    }

    fn env_override(
        &mut self,
        line: usize,
        target: &str,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ParseError> {
        let key = key.trim().trim_end_matches([':', '?', '+']).trim();
        let key = key.strip_prefix("export ").map(str::trim).unwrap_or(key);
        if !is_valid_variable_name(key) {
            return Err(ParseError::new(
                line,
                ParseErrorKind::InvalidVariableName(key.to_string()),
            )
            .in_target(target));
        }

        let value = self
            .expand(value.trim(), line, None)
            .map_err(|kind| ParseError::new(line, kind).in_target(target))?;
        self.env_overrides.push(EnvOverride {
            line,
            target: target.to_string(),
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        self.parser
            .overrides
            .get(name)
            .or_else(|| self.variables.get(name))
            .map(String::as_str)
    }

    fn expand(
        &self,
        text: &str,
        line: usize,
        automatic: Option<Automatic<'_>>,
    ) -> std::result::Result<String, ParseErrorKind> {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }

            match (chars.next(), automatic) {
                (Some('$'), _) => out.push('$'),
                (Some(open @ ('(' | '{')), _) => {
                    let close = if open == '(' { ')' } else { '}' };
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == close => break,
                            Some(c) => name.push(c),
                            None => return Err(ParseErrorKind::UnterminatedReference),
                        }
                    }

                    let name = name.trim();
                    if !is_valid_variable_name(name) {
                        return Err(ParseErrorKind::InvalidVariableName(name.to_string()));
                    }
                    match self.lookup(name) {
                        Some(value) => out.push_str(value),
                        None => warn!(variable = name, line, "undefined variable expands to empty"),
                    }
                }
                (Some('@'), Some(auto)) => out.push_str(auto.target),
                (Some('<'), Some(auto)) => {
                    if let Some(first) = auto.prerequisites.first() {
                        out.push_str(first);
                    }
                }
                (Some('^'), Some(auto)) => out.push_str(&auto.prerequisites.join(" ")),
                (Some(other), _) => return Err(ParseErrorKind::UnknownPlaceholder(format!("${}", other))),
                (None, _) => return Err(ParseErrorKind::UnknownPlaceholder("$".to_string())),
            }
        }

        Ok(out)
    }

    fn finish(mut self) -> std::result::Result<TaskGraph, ParseError> {
        let mut pending = std::mem::take(&mut self.targets);

        for env in std::mem::take(&mut self.env_overrides) {
            let Some(&idx) = self.index.get(&env.target) else {
                return Err(ParseError::new(
                    env.line,
                    ParseErrorKind::OverrideForUnknownTarget(env.target),
                ));
            };
            pending[idx].target.env.insert(env.key, env.value);
        }

        for (line, name) in &self.phony {
            match self.index.get(name) {
                Some(&idx) => pending[idx].target.phony = true,
                None => warn!(target_name = %name, line, "phony marker names an undeclared target"),
            }
        }

        let mut graph = TaskGraph::new();
        for PendingTarget { mut target, commands } in pending {
            for (line, raw) in commands {
                let (mut command, text) = CommandLine::split_modifiers(&raw);
                let automatic = Automatic {
                    target: &target.name,
                    prerequisites: &target.prerequisites,
                };
                command.text = self
                    .expand(text, line, Some(automatic))
                    .map_err(|kind| ParseError::new(line, kind).in_target(&target.name))?;

                if command.text.trim().is_empty() {
                    continue;
                }
                target.commands.push(command);
            }
            graph.insert(target);
        }

        if let Some(goal) = self.default_goal.take() {
            graph.set_default_goal(goal);
        }

        debug!(targets = graph.len(), "declaration parsed");
        Ok(graph)
    }
}
