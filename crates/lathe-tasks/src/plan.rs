//! Invocation plans

use serde::Serialize;

use crate::graph::TaskGraph;

/// Targets to run for one request, prerequisites first, each exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationPlan {
    /// Requested targets after defaulting, before deduplication
    requested: Vec<String>,
    /// Topologically sorted targets
    targets: Vec<String>,
    /// Level sets: every target's in-plan prerequisites sit in earlier waves
    waves: Vec<Vec<String>>,
}

impl InvocationPlan {
    pub(crate) fn new(requested: Vec<String>, targets: Vec<String>, waves: Vec<Vec<String>>) -> Self {
        Self {
            requested,
            targets,
            waves,
        }
    }

    /// Targets in execution order
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Targets as they were requested
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Level sets; targets within one wave do not depend on each other
    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    /// Number of planned targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if nothing is planned
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Position of a target in execution order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.targets.iter().position(|t| t == name)
    }

    /// Human-readable summary of the plan
    pub fn describe(&self, graph: &TaskGraph) -> String {
        let mut out = String::new();
        for (i, wave) in self.waves.iter().enumerate() {
            out.push_str(&format!("Wave {} ({} targets):\n", i, wave.len()));
            for name in wave {
                let Some(target) = graph.get(name) else {
                    continue;
                };
                let marker = if target.phony { " [phony]" } else { "" };
                if target.prerequisites.is_empty() {
                    out.push_str(&format!("  {}{}\n", name, marker));
                } else {
                    out.push_str(&format!(
                        "  {}{} (after: {})\n",
                        name,
                        marker,
                        target.prerequisites.join(", ")
                    ));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::target::Target;

    #[test]
    fn test_describe() {
        let graph = TaskGraph::from_targets(vec![
            Target::new("install").with_phony(true),
            Target::new("test").with_prerequisite("install"),
        ]);
        let plan = resolve(&graph, &["test".to_string()]).unwrap();

        let text = plan.describe(&graph);
        assert!(text.contains("Wave 0 (1 targets):\n  install [phony]\n"));
        assert!(text.contains("Wave 1 (1 targets):\n  test (after: install)\n"));
    }

    #[test]
    fn test_position() {
        let graph = TaskGraph::from_targets(vec![
            Target::new("a"),
            Target::new("b").with_prerequisite("a"),
        ]);
        let plan = resolve(&graph, &["b".to_string()]).unwrap();

        assert_eq!(plan.position("a"), Some(0));
        assert_eq!(plan.position("b"), Some(1));
        assert_eq!(plan.position("c"), None);
        assert!(!plan.is_empty());
    }
}
