//! Lathe Core - configuration and shared error types
//!
//! This crate holds the tool-level configuration (`lathe.toml` / `lathe.yaml`),
//! its discovery and validation, and the error types shared by the CLI.

pub mod config;
pub mod error;

pub use config::{
    find_config, load_config, load_config_or_default, Config, DeclarationConfig, OutputConfig,
    ShellConfig,
};
pub use error::{ConfigError, LatheError, Result};
