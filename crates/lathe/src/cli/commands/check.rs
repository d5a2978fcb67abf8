//! Check command

use tracing::info;

use lathe_tasks::resolve_request;

use crate::cli::{output, Cli, OutputFormat, Session};

/// Validate the declaration: references, cycles and the default target
#[derive(Debug)]
pub struct CheckCommand;

impl CheckCommand {
    pub fn execute(&self, cli: &Cli, session: &Session) -> anyhow::Result<()> {
        let graph = &session.graph;
        graph.validate()?;

        let default_plan = resolve_request(
            graph,
            &[],
            session.config.declaration.default_target.as_deref(),
        )?;
        info!(targets = graph.len(), "declaration is valid");

        if cli.format == OutputFormat::Json {
            let report = serde_json::json!({
                "valid": true,
                "declaration": session.declaration_path,
                "config": session.config_path,
                "targets": graph.len(),
                "default": default_plan.requested(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        if cli.quiet {
            return Ok(());
        }

        output::success(&format!(
            "{} is valid ({} target{})",
            output::path_style().apply_to(session.declaration_path.display()),
            graph.len(),
            if graph.len() == 1 { "" } else { "s" }
        ));

        if cli.verbose {
            if let Some(path) = &session.config_path {
                println!("{}", output::key_value("config", &path.display().to_string()));
            }
            println!(
                "{}",
                output::key_value("default", &default_plan.requested().join(" "))
            );
            println!("{}", output::key_value("root", &session.root.display().to_string()));
        }

        Ok(())
    }
}
