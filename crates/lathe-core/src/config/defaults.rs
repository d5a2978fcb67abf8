//! Default configuration values

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "lathe.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "lathe.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".lathe.toml",
        ".lathe.yaml",
    ]
}

/// Declaration file names tried, in order, when none is configured
pub fn declaration_file_names() -> Vec<&'static str> {
    vec!["Lathefile", "Makefile", "makefile"]
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Lathe configuration

[declaration]
# file = "Makefile"
# default_target = "help"

[shell]
program = "sh"
args = ["-c"]

[output]
echo_commands = true

[env]

[variables]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.shell.program, "sh");
        assert!(config.output.echo_commands);
    }

    #[test]
    fn test_toml_searched_first() {
        assert_eq!(config_file_names()[0], DEFAULT_CONFIG_TOML);
    }
}
