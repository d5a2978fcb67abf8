//! Init command

use tracing::info;

use lathe_core::config::defaults::{DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML};

use crate::cli::{output, Cli};

/// Write a starter configuration file
#[derive(Debug)]
pub struct InitCommand;

impl InitCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let config_path = cwd.join(DEFAULT_CONFIG_TOML);
        info!(path = %config_path.display(), "executing init command");

        if config_path.exists() {
            anyhow::bail!(
                "Configuration file already exists at {}",
                config_path.display()
            );
        }

        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        if cli.prints_text() {
            output::success(&format!(
                "Created {}",
                output::path_style().apply_to(config_path.display())
            ));
        }

        Ok(())
    }
}
