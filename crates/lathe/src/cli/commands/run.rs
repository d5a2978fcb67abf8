//! Run command: resolve the requested targets and execute them

use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use tracing::info;

use lathe_core::config::validation::resolve_shell;
use lathe_tasks::{
    resolve_request, shutdown_signal, ExecutionReport, Executor, ExecutorOptions, TaskEvent,
    TaskReporter, TaskReporterRegistry,
};

use crate::cli::{output, Cli, OutputFormat, Session};

/// Run targets (the default target when none are given)
#[derive(Debug)]
pub struct RunCommand {
    pub targets: Vec<String>,
}

impl RunCommand {
    pub fn execute(&self, cli: &Cli, session: &Session) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute_async(cli, session))
    }

    async fn execute_async(&self, cli: &Cli, session: &Session) -> anyhow::Result<()> {
        let graph = &session.graph;
        graph.validate()?;

        let plan = resolve_request(
            graph,
            &self.targets,
            session.config.declaration.default_target.as_deref(),
        )?;
        info!(requested = ?plan.requested(), planned = plan.len(), "running plan");

        if cli.dry_run && cli.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }

        if cli.prints_text() {
            if cli.verbose {
                output::info(&format!(
                    "{} target{} planned",
                    plan.len(),
                    if plan.len() == 1 { "" } else { "s" }
                ));
                print!("{}", plan.describe(graph));
            }
            if cli.dry_run {
                println!("{}", style("[DRY RUN - no commands will be executed]").yellow().bold());
            }
        }

        let shell = if cli.dry_run {
            PathBuf::from(&session.config.shell.program)
        } else {
            resolve_shell(&session.config.shell)?
        };

        let mut reporters = TaskReporterRegistry::new();
        if cli.prints_text() {
            reporters.register(ConsoleReporter::new(
                cli.verbose,
                session.config.output.echo_commands,
            ));
        }

        let options = ExecutorOptions {
            shell,
            shell_args: session.config.shell.args.clone(),
            root_dir: session.root.clone(),
            env: session.config.env.clone(),
            dry_run: cli.dry_run,
            stdout_to_stderr: cli.format == OutputFormat::Json,
        };
        let executor = Executor::new(options, Arc::new(reporters));
        let report = executor.execute_until(graph, &plan, shutdown_signal()).await;

        if cli.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&summary(&report))?);
        }

        report.into_result()?;
        Ok(())
    }
}

fn summary(report: &ExecutionReport) -> serde_json::Value {
    serde_json::json!({
        "success": report.is_success(),
        "total": report.results.len(),
        "succeeded": report.succeeded(),
        "failed": report.failed(),
        "skipped": report.skipped(),
        "duration_ms": report.duration.as_millis(),
        "error": report.failure().map(|e| e.to_string()),
        "targets": report.results.iter().map(|r| {
            serde_json::json!({
                "name": r.name,
                "status": r.status,
                "duration_ms": r.duration.as_millis(),
                "commands_run": r.commands_run,
            })
        }).collect::<Vec<_>>(),
    })
}

/// Console reporter: echoes commands as they start, progress when verbose
struct ConsoleReporter {
    verbose: bool,
    echo_commands: bool,
}

impl ConsoleReporter {
    fn new(verbose: bool, echo_commands: bool) -> Self {
        Self {
            verbose,
            echo_commands,
        }
    }
}

impl TaskReporter for ConsoleReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::TargetStarted {
                name,
                command_count,
            } => {
                if self.verbose {
                    println!(
                        "{} {} {}",
                        style("▸").dim(),
                        output::target_style().apply_to(name),
                        style(format!("({} commands)", command_count)).dim()
                    );
                }
            }
            TaskEvent::Command {
                command,
                silent,
                dry_run,
                ..
            } => {
                if *dry_run || (self.echo_commands && !*silent) {
                    println!("{}", command);
                }
            }
            TaskEvent::CommandFailureIgnored {
                target,
                command,
                code,
            } => {
                output::warning(&format!(
                    "{}: `{}` exited with code {} (ignored)",
                    target, command, code
                ));
            }
            TaskEvent::TargetCompleted { name, duration } => {
                if self.verbose {
                    println!(
                        "{} {} {}",
                        style("✓").green(),
                        style(name).green(),
                        output::duration(*duration)
                    );
                }
            }
            TaskEvent::TargetFailed { name, duration, .. } => {
                if self.verbose {
                    println!(
                        "{} {} {}",
                        style("✗").red(),
                        style(name).red(),
                        output::duration(*duration)
                    );
                }
            }
            TaskEvent::TargetSkipped { name, reason } => {
                if self.verbose {
                    println!(
                        "{} {} {}",
                        style("○").yellow(),
                        style(name).yellow(),
                        style(format!("({})", reason)).dim()
                    );
                }
            }
            TaskEvent::AllCompleted {
                total,
                succeeded,
                failed,
                skipped,
                duration,
            } => {
                if self.verbose {
                    println!(
                        "{} {}/{} succeeded, {} failed, {} skipped ({:.1}s)",
                        if *failed == 0 {
                            style("✓").green().bold()
                        } else {
                            style("✗").red().bold()
                        },
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use lathe_tasks::{TargetResult, TargetStatus, TaskError};

    #[test]
    fn test_summary_json() {
        let report = ExecutionReport {
            results: vec![
                TargetResult {
                    name: "build".to_string(),
                    status: TargetStatus::Success,
                    duration: Duration::from_millis(12),
                    commands_run: 2,
                },
                TargetResult {
                    name: "test".to_string(),
                    status: TargetStatus::Failed,
                    duration: Duration::from_millis(3),
                    commands_run: 1,
                },
            ],
            failure: Some(TaskError::CommandFailure {
                target: "test".to_string(),
                command: "pytest".to_string(),
                code: 1,
            }),
            duration: Duration::from_millis(15),
        };

        let value = summary(&report);
        assert_eq!(value["success"], false);
        assert_eq!(value["succeeded"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["targets"][0]["status"], "success");
        assert_eq!(value["targets"][1]["commands_run"], 1);
        assert!(value["error"].as_str().unwrap().contains("pytest"));
    }
}
