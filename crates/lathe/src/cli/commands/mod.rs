//! CLI commands

mod check;
mod completions;
mod init;
mod list;
mod run;

pub use check::CheckCommand;
pub use completions::{CompletionsCommand, ShellType};
pub use init::InitCommand;
pub use list::ListCommand;
pub use run::RunCommand;
