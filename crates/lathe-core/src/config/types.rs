//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration for Lathe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the declaration lives and which target runs by default
    pub declaration: DeclarationConfig,

    /// Shell used to run every command
    pub shell: ShellConfig,

    /// Console output settings
    pub output: OutputConfig,

    /// Environment merged into every child process
    pub env: BTreeMap<String, String>,

    /// Default values for declaration variables
    pub variables: BTreeMap<String, String>,
}

/// Declaration file settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarationConfig {
    /// Declaration file, relative to the config file's directory
    pub file: Option<PathBuf>,

    /// Target to run when none is requested
    pub default_target: Option<String>,
}

/// Shell configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Shell program
    pub program: String,

    /// Arguments placed before the command text
    pub args: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".to_string(),
                args: vec!["/C".to_string()],
            }
        } else {
            Self {
                program: "sh".to_string(),
                args: vec!["-c".to_string()],
            }
        }
    }
}

/// Console output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print each command before running it
    pub echo_commands: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            echo_commands: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shell() {
        let shell = ShellConfig::default();
        if cfg!(windows) {
            assert_eq!(shell.program, "cmd");
        } else {
            assert_eq!(shell.program, "sh");
            assert_eq!(shell.args, vec!["-c"]);
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[declaration]\ndefault_target = \"test\"\n").unwrap();
        assert_eq!(config.declaration.default_target.as_deref(), Some("test"));
        assert!(config.output.echo_commands);
        assert!(config.env.is_empty());
    }

    #[test]
    fn test_yaml_env_and_variables() {
        let yaml = "env:\n  PYTHONUNBUFFERED: \"1\"\nvariables:\n  PYTHON: python3\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.env.get("PYTHONUNBUFFERED"), Some(&"1".to_string()));
        assert_eq!(config.variables.get("PYTHON"), Some(&"python3".to_string()));
    }
}
