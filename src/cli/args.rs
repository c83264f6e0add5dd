//! Clap-derived argument definitions for the four subcommands of
//! spec.md §6, plus the ambient global flags SPEC_FULL.md §6 adds
//! (`-v/--verbose`, `--log-format`), grounded on the teacher's
//! `cli::args::Cli`/`Commands` split: one parent struct carrying shared
//! flags, one subcommand enum carrying per-command arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "reef")]
#[command(about = "Bash compatibility layer: detect, translate, and pass through bash syntax")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise the tracing filter to DEBUG. Overridden by `REEF_LOG` when set.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Structured-logging output format.
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report whether input looks like bash syntax (tier-1 fast path).
    Detect {
        /// Force the O(n) heuristic scan only; skip the full-parser check.
        #[arg(long)]
        quick: bool,

        /// The input to examine.
        input: String,
    },

    /// Translate bash input into host-shell (fish) source.
    Translate {
        /// The input to translate.
        input: String,
    },

    /// Execute input under a real bash subprocess.
    BashExec {
        /// Emit a host-shell env-delta script after the command's own output.
        #[arg(long)]
        env_diff: bool,

        /// Persist/seed environment state across invocations via this file.
        #[arg(long, value_name = "PATH")]
        state_file: Option<PathBuf>,

        /// The input to execute.
        input: String,
    },

    /// Manage and use a persistent bash coprocess.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },
}

#[derive(Subcommand)]
pub enum DaemonCommands {
    /// Start serving on a Unix-domain socket. Blocks the calling thread.
    Start {
        #[arg(long, value_name = "PATH")]
        socket: PathBuf,
    },

    /// Ask a running daemon to stop accepting connections and exit.
    Stop {
        #[arg(long, value_name = "PATH")]
        socket: PathBuf,
    },

    /// Send input to a running daemon and print its streamed response.
    Exec {
        #[arg(long, value_name = "PATH")]
        socket: PathBuf,

        /// The input to execute.
        input: String,
    },
}
