//! Error taxonomy for the task engine

use thiserror::Error;

/// Result type alias using TaskError
pub type Result<T> = std::result::Result<T, TaskError>;

/// Errors raised while loading, resolving, or running targets
#[derive(Debug, Error)]
pub enum TaskError {
    /// The declaration could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A requested target or prerequisite does not exist
    #[error("Unknown target '{name}'{}", required_by(.referenced_by))]
    UnknownTarget {
        name: String,
        referenced_by: Option<String>,
    },

    /// Targets depend on each other in a loop
    #[error("Cyclic dependency detected among targets: {}", cycle_path(.0))]
    CyclicDependency(Vec<String>),

    /// Nothing was requested and no default target exists
    #[error("No target requested and the declaration defines no default target")]
    NoTargets,

    /// A command exited with a non-zero status
    #[error("Target '{target}' failed: `{command}` exited with code {code}")]
    CommandFailure {
        target: String,
        command: String,
        code: i32,
    },

    /// The shell could not be started
    #[error("Target '{target}' failed: could not run `{command}`: {source}")]
    Spawn {
        target: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled while a command was in flight
    #[error("Target '{target}' interrupted while running `{command}`")]
    Interrupted { target: String, command: String },

    /// IO error reading a declaration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskError {
    /// Errors found while turning a request into a plan
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTarget { .. } | Self::CyclicDependency(_) | Self::NoTargets
        )
    }
}

fn required_by(referenced_by: &Option<String>) -> String {
    match referenced_by {
        Some(target) => format!(" (required by '{}')", target),
        None => String::new(),
    }
}

fn cycle_path(members: &[String]) -> String {
    match members.first() {
        Some(first) => format!("{} -> {}", members.join(" -> "), first),
        None => String::new(),
    }
}

/// A malformed declaration, located by line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}{}: {kind}", in_target(.target))]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    /// Target being declared at that line, when known
    pub target: Option<String>,
    /// What went wrong
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self {
            line,
            target: None,
            kind,
        }
    }

    pub fn in_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

fn in_target(target: &Option<String>) -> String {
    match target {
        Some(name) => format!(" (target '{}')", name),
        None => String::new(),
    }
}

/// Reasons a declaration line is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("duplicate target '{name}' (first declared on line {first_line})")]
    DuplicateTarget { name: String, first_line: usize },

    #[error("empty target name")]
    EmptyTargetName,

    #[error("invalid target name '{0}'")]
    InvalidTargetName(String),

    #[error("malformed prerequisite '{0}'")]
    MalformedPrerequisite(String),

    #[error("command line outside of any target")]
    CommandOutsideTarget,

    #[error("expected a 'target:' header or a variable assignment")]
    MissingSeparator,

    #[error("invalid variable name '{0}'")]
    InvalidVariableName(String),

    #[error("unknown placeholder '{0}' (write '$$' for a literal '$')")]
    UnknownPlaceholder(String),

    #[error("unterminated variable reference")]
    UnterminatedReference,

    #[error("'{0}' needs at least one target name")]
    EmptyMarker(String),

    #[error("'.DEFAULT_GOAL' takes exactly one target name, got {0}")]
    AmbiguousDefaultGoal(usize),

    #[error("environment override for undeclared target '{0}'")]
    OverrideForUnknownTarget(String),
}
