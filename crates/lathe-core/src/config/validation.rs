//! Configuration validation

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::{Config, ShellConfig};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_declaration(config)?;
    validate_shell(&config.shell)?;
    validate_env(config)?;
    validate_variables(config)?;
    debug!("configuration validation passed");
    Ok(())
}

/// Resolve the configured shell program to an executable path
pub fn resolve_shell(shell: &ShellConfig) -> Result<PathBuf> {
    which::which(&shell.program).map_err(|e| {
        ConfigError::InvalidValue {
            field: "shell.program".to_string(),
            message: format!("'{}' not found on PATH: {}", shell.program, e),
        }
        .into()
    })
}

fn validate_declaration(config: &Config) -> Result<()> {
    if let Some(target) = &config.declaration.default_target {
        if target.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "declaration.default_target".to_string(),
                message: "default target cannot be empty".to_string(),
            }
            .into());
        }
    }

    if let Some(file) = &config.declaration.file {
        if file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "declaration.file".to_string(),
                message: "declaration file cannot be empty".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

fn validate_shell(shell: &ShellConfig) -> Result<()> {
    if shell.program.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "shell.program".to_string(),
            message: "shell program cannot be empty".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_env(config: &Config) -> Result<()> {
    for key in config.env.keys() {
        if key.is_empty() || key.contains('=') || key.contains('\0') {
            return Err(ConfigError::InvalidValue {
                field: format!("env.{}", key),
                message: "environment variable names cannot be empty or contain '=' or NUL"
                    .to_string(),
            }
            .into());
        }
    }

    Ok(())
}

fn validate_variables(config: &Config) -> Result<()> {
    for name in config.variables.keys() {
        if !is_valid_variable_name(name) {
            return Err(ConfigError::InvalidValue {
                field: format!("variables.{}", name),
                message: "variable names must be letters, digits, or underscores and not start with a digit".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

fn variable_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Whether `name` is usable as a variable or environment override key
pub fn is_valid_variable_name(name: &str) -> bool {
    variable_name_pattern().is_match(name)
}
