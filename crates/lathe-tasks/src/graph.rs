//! Task graph construction and queries

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::resolver::Resolver;
use crate::target::Target;

/// All declared targets, keyed by name, in declaration order
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    /// Targets indexed by name
    targets: HashMap<String, Target>,
    /// Names in declaration order
    order: Vec<String>,
    /// Target named by `.DEFAULT_GOAL`
    default_goal: Option<String>,
}

impl TaskGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from targets; a later target replaces an earlier one of the same name
    pub fn from_targets(targets: impl IntoIterator<Item = Target>) -> Self {
        let mut graph = Self::new();
        for target in targets {
            graph.insert(target);
        }
        graph
    }

    /// Insert a target, returning the one it replaced
    pub fn insert(&mut self, target: Target) -> Option<Target> {
        let name = target.name.clone();
        let previous = self.targets.insert(name.clone(), target);
        if previous.is_none() {
            self.order.push(name);
        }
        previous
    }

    /// Get a target by name
    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Whether a target is declared
    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets in declaration order
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.order.iter().filter_map(|name| self.targets.get(name))
    }

    /// Target names in declaration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Set the explicitly marked default target
    pub fn set_default_goal(&mut self, name: impl Into<String>) {
        self.default_goal = Some(name.into());
    }

    /// The explicitly marked default target, if any
    pub fn default_goal(&self) -> Option<&str> {
        self.default_goal.as_deref()
    }

    /// The target run when nothing is requested: the marked default, else the
    /// first declared target whose name does not start with `.`
    pub fn default_target(&self) -> Option<&str> {
        self.default_goal.as_deref().or_else(|| {
            self.order
                .iter()
                .find(|name| !name.starts_with('.'))
                .map(String::as_str)
        })
    }

    /// Check every prerequisite reference and reject cycles anywhere in the graph
    #[instrument(skip_all, fields(targets = self.len()))]
    pub fn validate(&self) -> Result<()> {
        let mut resolver = Resolver::new(self);
        for name in &self.order {
            resolver.visit(name, None)?;
        }
        debug!("task graph validated");
        Ok(())
    }
}
