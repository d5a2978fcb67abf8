//! Dependency resolution: requested targets to an ordered invocation plan

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::error::{Result, TaskError};
use crate::graph::TaskGraph;
use crate::plan::InvocationPlan;
use crate::target::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first resolver.
///
/// Prerequisites are visited left to right before the target itself. A node
/// met again while still `Visiting` closes a cycle; a `Done` node is skipped.
/// The walk keeps its own stack, so chain depth is bounded by memory only.
pub(crate) struct Resolver<'g> {
    graph: &'g TaskGraph,
    marks: HashMap<&'g str, Mark>,
    path: Vec<&'g str>,
    order: Vec<&'g str>,
    waves: HashMap<&'g str, usize>,
}

impl<'g> Resolver<'g> {
    pub(crate) fn new(graph: &'g TaskGraph) -> Self {
        Self {
            graph,
            marks: HashMap::new(),
            path: Vec::new(),
            order: Vec::new(),
            waves: HashMap::new(),
        }
    }

    pub(crate) fn visit(&mut self, name: &str, referenced_by: Option<&str>) -> Result<()> {
        let Some(root) = self.enter(name, referenced_by)? else {
            return Ok(());
        };

        // Each frame holds a target and the index of its next prerequisite
        let mut stack: Vec<(&'g Target, usize)> = vec![(root, 0)];
        while let Some(frame) = stack.last_mut() {
            let target = frame.0;
            match target.prerequisites.get(frame.1) {
                Some(prerequisite) => {
                    frame.1 += 1;
                    if let Some(next) = self.enter(prerequisite, Some(target.name.as_str()))? {
                        stack.push((next, 0));
                    }
                }
                None => {
                    stack.pop();
                    self.leave(target);
                }
            }
        }

        Ok(())
    }

    /// Mark `name` as visiting; `None` when it is already done
    fn enter(&mut self, name: &str, referenced_by: Option<&str>) -> Result<Option<&'g Target>> {
        let graph = self.graph;
        let target = graph.get(name).ok_or_else(|| TaskError::UnknownTarget {
            name: name.to_string(),
            referenced_by: referenced_by.map(str::to_string),
        })?;
        let key = target.name.as_str();

        match self.marks.get(key) {
            Some(Mark::Done) => return Ok(None),
            Some(Mark::Visiting) => {
                let start = self.path.iter().position(|n| *n == key).unwrap_or(0);
                let members = self.path[start..].iter().map(|n| n.to_string()).collect();
                return Err(TaskError::CyclicDependency(members));
            }
            None => {}
        }

        self.marks.insert(key, Mark::Visiting);
        self.path.push(key);
        Ok(Some(target))
    }

    /// All prerequisites of `target` are done; append it to the order
    fn leave(&mut self, target: &'g Target) {
        let key = target.name.as_str();
        self.path.pop();
        self.marks.insert(key, Mark::Done);

        let wave = target
            .prerequisites
            .iter()
            .filter_map(|p| self.waves.get(p.as_str()))
            .max()
            .map(|w| w + 1)
            .unwrap_or(0);
        self.waves.insert(key, wave);
        self.order.push(key);
    }

    pub(crate) fn finish(self, requested: Vec<String>) -> InvocationPlan {
        let max_wave = self.waves.values().max().copied().unwrap_or(0);
        let mut waves: Vec<Vec<String>> = if self.order.is_empty() {
            Vec::new()
        } else {
            vec![Vec::new(); max_wave + 1]
        };

        for name in &self.order {
            if let Some(&wave) = self.waves.get(name) {
                waves[wave].push(name.to_string());
            }
        }

        InvocationPlan::new(
            requested,
            self.order.iter().map(|n| n.to_string()).collect(),
            waves,
        )
    }
}

/// Resolve requested targets into an invocation plan.
///
/// Every transitively required prerequisite appears exactly once, before
/// everything that depends on it. Repeated requests are deduplicated.
#[instrument(skip(graph), fields(targets = graph.len()))]
pub fn resolve(graph: &TaskGraph, requested: &[String]) -> Result<InvocationPlan> {
    let mut resolver = Resolver::new(graph);
    for name in requested {
        resolver.visit(name, None)?;
    }

    let plan = resolver.finish(requested.to_vec());
    info!(
        planned = plan.len(),
        waves = plan.waves().len(),
        "invocation plan resolved"
    );
    Ok(plan)
}

/// Resolve a request, falling back to a default target when it is empty.
///
/// The fallback order is `configured_default`, then the graph's own default
/// (`.DEFAULT_GOAL` or the first declared target).
pub fn resolve_request(
    graph: &TaskGraph,
    requested: &[String],
    configured_default: Option<&str>,
) -> Result<InvocationPlan> {
    if !requested.is_empty() {
        return resolve(graph, requested);
    }

    let default = configured_default
        .or_else(|| graph.default_target())
        .ok_or(TaskError::NoTargets)?;
    debug!(target_name = default, "no targets requested, using default");
    resolve(graph, &[default.to_string()])
}
