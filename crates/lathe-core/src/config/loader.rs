//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, LatheError, Result};

use super::defaults::{config_file_names, declaration_file_names};
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`          (e.g. `lathe.toml`)
///   2. `<dir>/.config/<name>`  (e.g. `.config/lathe.toml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.is_file() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let nested_path = current.join(".config").join(name);
            if nested_path.is_file() {
                info!(path = %nested_path.display(), "found config file in .config/");
                return Some(nested_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration or use defaults.
///
/// A missing file falls back to defaults; a file that exists but fails to
/// parse or validate is an error.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match load_config_from_dir(dir) {
        Ok((config, path)) => Ok((config, Some(path))),
        Err(LatheError::Config(ConfigError::NotFound(_))) => {
            debug!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
        Err(e) => Err(e),
    }
}

/// Locate the declaration file.
///
/// An explicit path wins. Otherwise `declaration.file` from the config is
/// resolved against the config file's directory, and finally the default
/// names are tried in `dir`.
pub fn resolve_declaration_path(
    dir: &Path,
    explicit: Option<&Path>,
    config: &Config,
    config_path: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(dir.join(path));
    }

    if let Some(file) = &config.declaration.file {
        let base = config_path
            .and_then(config_root)
            .unwrap_or_else(|| dir.to_path_buf());
        return Ok(base.join(file));
    }

    for name in declaration_file_names() {
        let candidate = dir.join(name);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "found declaration file");
            return Ok(candidate);
        }
    }

    Err(LatheError::DeclarationNotFound {
        dir: dir.to_path_buf(),
        candidates: declaration_file_names().join(", "),
    })
}

/// Directory a config file applies to (the parent of `.config/` when nested)
fn config_root(config_path: &Path) -> Option<PathBuf> {
    let parent = config_path.parent()?;
    if parent.file_name().is_some_and(|n| n == ".config") {
        parent.parent().map(Path::to_path_buf)
    } else {
        Some(parent.to_path_buf())
    }
}
