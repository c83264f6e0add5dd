//! Command-line interface: the four subcommands of spec.md §6
//! (`detect`, `translate`, `bash-exec`, `daemon`), grounded on the
//! teacher's `cli::args` + `cli::commands` split.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, DaemonCommands, LogFormat};
pub use commands::execute_command;
