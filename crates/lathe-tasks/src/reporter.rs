//! Execution progress reporting

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Events emitted while a plan runs
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A target is about to run its commands
    TargetStarted { name: String, command_count: usize },
    /// A command is about to run (or would run, in a dry run)
    Command {
        target: String,
        command: String,
        silent: bool,
        dry_run: bool,
    },
    /// A `-` prefixed command failed and the target kept going
    CommandFailureIgnored {
        target: String,
        command: String,
        code: i32,
    },
    /// A target finished every command
    TargetCompleted { name: String, duration: Duration },
    /// A target stopped on a failing command
    TargetFailed {
        name: String,
        duration: Duration,
        error: String,
    },
    /// A target was not run
    TargetSkipped { name: String, reason: String },
    /// The plan finished (successfully or not)
    AllCompleted {
        total: usize,
        succeeded: usize,
        failed: usize,
        skipped: usize,
        duration: Duration,
    },
}

/// Trait for reporting execution progress
pub trait TaskReporter: Send + Sync {
    /// Handle an event
    fn report(&self, event: &TaskEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl TaskReporter for TracingReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::TargetStarted {
                name,
                command_count,
            } => {
                tracing::info!("Starting {} ({} commands)", name, command_count);
            }
            TaskEvent::Command {
                target,
                command,
                dry_run,
                ..
            } => {
                if *dry_run {
                    tracing::info!("[{}] would run: {}", target, command);
                } else {
                    tracing::debug!("[{}] {}", target, command);
                }
            }
            TaskEvent::CommandFailureIgnored {
                target,
                command,
                code,
            } => {
                tracing::warn!("[{}] `{}` exited with code {} (ignored)", target, command, code);
            }
            TaskEvent::TargetCompleted { name, duration } => {
                tracing::info!("{} completed in {:.1}s", name, duration.as_secs_f64());
            }
            TaskEvent::TargetFailed {
                name,
                duration,
                error,
            } => {
                tracing::error!("{} failed after {:.1}s: {}", name, duration.as_secs_f64(), error);
            }
            TaskEvent::TargetSkipped { name, reason } => {
                tracing::info!("{} skipped: {}", name, reason);
            }
            TaskEvent::AllCompleted {
                total,
                succeeded,
                failed,
                skipped,
                duration,
            } => {
                tracing::info!(
                    "All targets done: {}/{} succeeded, {} failed, {} skipped ({:.1}s)",
                    succeeded,
                    total,
                    failed,
                    skipped,
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Reporter that collects events for later inspection
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<TaskEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TaskReporter for CollectingReporter {
    fn report(&self, event: &TaskEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Registry of reporters that all receive every event
pub struct TaskReporterRegistry {
    reporters: Vec<Arc<dyn TaskReporter>>,
}

impl TaskReporterRegistry {
    pub fn new() -> Self {
        Self {
            reporters: vec![Arc::new(TracingReporter)],
        }
    }

    pub fn empty() -> Self {
        Self {
            reporters: Vec::new(),
        }
    }

    pub fn register<R: TaskReporter + 'static>(&mut self, reporter: R) {
        self.reporters.push(Arc::new(reporter));
    }

    /// Register a reporter the caller keeps a handle to
    pub fn register_shared(&mut self, reporter: Arc<dyn TaskReporter>) {
        self.reporters.push(reporter);
    }

    pub fn all(&self) -> &[Arc<dyn TaskReporter>] {
        &self.reporters
    }

    /// Broadcast an event to all registered reporters
    pub fn broadcast(&self, event: &TaskEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}

impl Default for TaskReporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskReporter for TaskReporterRegistry {
    fn report(&self, event: &TaskEvent) {
        self.broadcast(event);
    }
}
