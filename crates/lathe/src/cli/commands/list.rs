//! List command

use console::style;
use tracing::info;

use crate::cli::{output, Cli, OutputFormat, Session};

/// Print declared targets in declaration order
#[derive(Debug)]
pub struct ListCommand;

impl ListCommand {
    pub fn execute(&self, cli: &Cli, session: &Session) -> anyhow::Result<()> {
        let graph = &session.graph;
        let default = session
            .config
            .declaration
            .default_target
            .as_deref()
            .or_else(|| graph.default_target());
        info!(targets = graph.len(), "listing targets");

        if cli.format == OutputFormat::Json {
            let targets: Vec<_> = graph.targets().collect();
            let listing = serde_json::json!({
                "declaration": session.declaration_path,
                "default": default,
                "targets": targets,
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
            return Ok(());
        }

        if cli.quiet {
            for target in graph.targets() {
                println!("{}", target.name);
            }
            return Ok(());
        }

        println!("{}", output::header("Targets:"));
        for target in graph.targets() {
            let mut line = format!("  {}", output::target_style().apply_to(&target.name));
            if Some(target.name.as_str()) == default {
                line.push_str(&format!(" {}", style("(default)").green()));
            }
            if target.phony {
                line.push_str(&format!(" {}", style("[phony]").dim()));
            }
            if !target.prerequisites.is_empty() {
                line.push_str(&format!(
                    " {}",
                    style(format!("(after: {})", target.prerequisites.join(", "))).dim()
                ));
            }
            println!("{}", line);

            if cli.verbose {
                for command in &target.commands {
                    println!("      {}", style(&command.text).dim());
                }
            }
        }

        Ok(())
    }
}
