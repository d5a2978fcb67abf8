//! Plan executor: runs each target's commands through the shell, in plan order

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::{Result, TaskError};
use crate::graph::TaskGraph;
use crate::plan::InvocationPlan;
use crate::reporter::{TaskEvent, TaskReporter};
use crate::target::{CommandLine, Target};

/// Environment variable holding the name of the running target
pub const TARGET_ENV_VAR: &str = "LATHE_TARGET";

/// Result of running a single target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResult {
    pub name: String,
    pub status: TargetStatus,
    pub duration: Duration,
    /// Commands actually started
    pub commands_run: usize,
}

/// Target execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Success,
    Failed,
    Skipped,
}

/// Outcome of running a whole plan
#[derive(Debug)]
pub struct ExecutionReport {
    /// One entry per planned target, in plan order
    pub results: Vec<TargetResult>,
    /// The error that stopped the run
    pub failure: Option<TaskError>,
    pub duration: Duration,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&TaskError> {
        self.failure.as_ref()
    }

    /// Convert into a plain result, dropping per-target detail
    pub fn into_result(self) -> Result<()> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn count(&self, status: TargetStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(TargetStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(TargetStatus::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(TargetStatus::Skipped)
    }
}

/// Options for the executor
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Shell program every command is handed to
    pub shell: PathBuf,
    /// Arguments placed before the command text
    pub shell_args: Vec<String>,
    /// Working directory for every command
    pub root_dir: PathBuf,
    /// Extra environment applied before per-target overrides
    pub env: BTreeMap<String, String>,
    /// Report commands without running them
    pub dry_run: bool,
    /// Send command stdout to our stderr, leaving stdout for machine-readable output
    pub stdout_to_stderr: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        let (shell, args) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };
        Self {
            shell: PathBuf::from(shell),
            shell_args: vec![args.to_string()],
            root_dir: std::env::current_dir().unwrap_or_default(),
            env: BTreeMap::new(),
            dry_run: false,
            stdout_to_stderr: false,
        }
    }
}

/// Sequential executor; stops at the first failing target
pub struct Executor {
    options: ExecutorOptions,
    reporter: Arc<dyn TaskReporter>,
}

impl Executor {
    /// Create a new executor
    pub fn new(options: ExecutorOptions, reporter: Arc<dyn TaskReporter>) -> Self {
        Self { options, reporter }
    }

    /// Run every target of the plan
    pub async fn execute(&self, graph: &TaskGraph, plan: &InvocationPlan) -> ExecutionReport {
        self.execute_until(graph, plan, std::future::pending()).await
    }

    /// Run the plan, killing the running command once `shutdown` completes
    #[instrument(skip_all, fields(targets = plan.len(), dry_run = self.options.dry_run))]
    pub async fn execute_until<F>(
        &self,
        graph: &TaskGraph,
        plan: &InvocationPlan,
        shutdown: F,
    ) -> ExecutionReport
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let start = Instant::now();
        let mut results = Vec::with_capacity(plan.len());
        let mut failure: Option<TaskError> = None;

        for name in plan.targets() {
            if failure.is_some() {
                self.reporter.report(&TaskEvent::TargetSkipped {
                    name: name.clone(),
                    reason: "an earlier target failed".to_string(),
                });
                results.push(TargetResult {
                    name: name.clone(),
                    status: TargetStatus::Skipped,
                    duration: Duration::ZERO,
                    commands_run: 0,
                });
                continue;
            }

            let Some(target) = graph.get(name) else {
                failure = Some(TaskError::UnknownTarget {
                    name: name.clone(),
                    referenced_by: None,
                });
                results.push(TargetResult {
                    name: name.clone(),
                    status: TargetStatus::Failed,
                    duration: Duration::ZERO,
                    commands_run: 0,
                });
                continue;
            };

            let (result, error) = if self.options.dry_run {
                (self.dry_run_target(target), None)
            } else {
                self.run_target(target, &mut shutdown).await
            };
            results.push(result);
            failure = error;
        }

        let report = ExecutionReport {
            results,
            failure,
            duration: start.elapsed(),
        };

        self.reporter.report(&TaskEvent::AllCompleted {
            total: report.results.len(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            skipped: report.skipped(),
            duration: report.duration,
        });

        report
    }

    fn dry_run_target(&self, target: &Target) -> TargetResult {
        for command in &target.commands {
            self.reporter.report(&TaskEvent::Command {
                target: target.name.clone(),
                command: command.text.clone(),
                silent: command.silent,
                dry_run: true,
            });
        }
        self.reporter.report(&TaskEvent::TargetSkipped {
            name: target.name.clone(),
            reason: "dry run".to_string(),
        });

        TargetResult {
            name: target.name.clone(),
            status: TargetStatus::Skipped,
            duration: Duration::ZERO,
            commands_run: 0,
        }
    }

    async fn run_target<F>(
        &self,
        target: &Target,
        shutdown: &mut Pin<&mut F>,
    ) -> (TargetResult, Option<TaskError>)
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        let mut commands_run = 0;

        self.reporter.report(&TaskEvent::TargetStarted {
            name: target.name.clone(),
            command_count: target.commands.len(),
        });

        for command in &target.commands {
            self.reporter.report(&TaskEvent::Command {
                target: target.name.clone(),
                command: command.text.clone(),
                silent: command.silent,
                dry_run: false,
            });
            commands_run += 1;

            let outcome = match self.run_command(target, command, shutdown).await {
                Ok(0) => continue,
                Ok(code) if command.ignore_errors => {
                    self.reporter.report(&TaskEvent::CommandFailureIgnored {
                        target: target.name.clone(),
                        command: command.text.clone(),
                        code,
                    });
                    continue;
                }
                Ok(code) => TaskError::CommandFailure {
                    target: target.name.clone(),
                    command: command.text.clone(),
                    code,
                },
                Err(err) => err,
            };

            let duration = start.elapsed();
            self.reporter.report(&TaskEvent::TargetFailed {
                name: target.name.clone(),
                duration,
                error: outcome.to_string(),
            });
            let result = TargetResult {
                name: target.name.clone(),
                status: TargetStatus::Failed,
                duration,
                commands_run,
            };
            return (result, Some(outcome));
        }

        let duration = start.elapsed();
        self.reporter.report(&TaskEvent::TargetCompleted {
            name: target.name.clone(),
            duration,
        });
        let result = TargetResult {
            name: target.name.clone(),
            status: TargetStatus::Success,
            duration,
            commands_run,
        };
        (result, None)
    }

    /// Run one command and return its exit code
    async fn run_command<F>(
        &self,
        target: &Target,
        command: &CommandLine,
        shutdown: &mut Pin<&mut F>,
    ) -> Result<i32>
    where
        F: Future<Output = ()>,
    {
        let stdout = if self.options.stdout_to_stderr {
            Stdio::from(std::io::stderr())
        } else {
            Stdio::inherit()
        };

        let mut cmd = Command::new(&self.options.shell);
        cmd.args(&self.options.shell_args)
            .arg(&command.text)
            .current_dir(&self.options.root_dir)
            .envs(&self.options.env)
            .env(TARGET_ENV_VAR, &target.name)
            .envs(&target.env)
            .stdin(Stdio::inherit())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| TaskError::Spawn {
            target: target.name.clone(),
            command: command.text.clone(),
            source,
        })?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|source| TaskError::Spawn {
                    target: target.name.clone(),
                    command: command.text.clone(),
                    source,
                })?;
                let code = exit_code(&status);
                debug!(target_name = %target.name, code, "command finished");
                Ok(code)
            }
            _ = shutdown.as_mut() => {
                warn!(target_name = %target.name, "interrupted, stopping command");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill command");
                }
                Err(TaskError::Interrupted {
                    target: target.name.clone(),
                    command: command.text.clone(),
                })
            }
        }
    }
}

/// Exit code of a finished process; signals map to `128 + signal`
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Completes on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
