//! Shell completions generation

use std::io;

use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};
use tracing::info;

use crate::cli::Cli;

/// Generate shell completions
#[derive(Debug)]
pub struct CompletionsCommand {
    pub shell: ShellType,
}

/// Supported shell types
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl From<ShellType> for Shell {
    fn from(shell: ShellType) -> Self {
        match shell {
            ShellType::Bash => Shell::Bash,
            ShellType::Zsh => Shell::Zsh,
            ShellType::Fish => Shell::Fish,
            ShellType::PowerShell => Shell::PowerShell,
            ShellType::Elvish => Shell::Elvish,
        }
    }
}

impl CompletionsCommand {
    /// Write completions for the chosen shell to stdout
    pub fn execute(&self) -> anyhow::Result<()> {
        info!(shell = ?self.shell, "generating completions");
        let mut cmd = Cli::command();
        generate(Shell::from(self.shell), &mut cmd, "lathe", &mut io::stdout());
        Ok(())
    }
}
