//! Subcommand dispatch, grounded on the teacher's `cli::commands::execute_command`
//! pattern: one `match` over the parsed [`Commands`] enum, logging
//! initialized once at the top before any subcommand runs.
//!
//! Per spec.md §7, the core never writes diagnostics to stdout — only
//! the subcommand's defined output (translated source, command output,
//! env-delta script) goes there. Everything else, including `tracing`
//! output, goes to stderr.

use std::io::{self, Write};
use std::process::ExitCode as ProcessExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, Commands, DaemonCommands, LogFormat};
use crate::error::ReefError;
use crate::passthrough::{self, BashExecOptions};
use crate::{daemon, detector, translate};

/// Raw process exit code (0-255), distinct from [`crate::error::ExitCode`]:
/// `bash-exec` and `daemon exec` must propagate the subprocess's own exit
/// code verbatim (spec.md §6: "Exit code is that of the bash subprocess"
/// / "Other codes propagate from the subprocess"), which can be any byte
/// value, not just the four core-internal codes.
type RawExitCode = u8;

/// Initializes the global `tracing` subscriber from `cli`'s flags and the
/// `REEF_LOG` environment variable (SPEC_FULL.md §6), then dispatches to
/// the requested subcommand and returns the process exit code to use.
pub fn execute_command(cli: Cli) -> ProcessExitCode {
    init_logging(&cli);

    let result = match cli.command {
        Commands::Detect { quick, input } => detect_command(quick, &input),
        Commands::Translate { input } => translate_command(&input),
        Commands::BashExec { env_diff, state_file, input } => {
            bash_exec_command(env_diff, state_file.as_deref(), &input)
        }
        Commands::Daemon { command } => daemon_command(command),
    };

    match result {
        Ok(code) => ProcessExitCode::from(code),
        Err(e) => {
            eprintln!("reef: {e}");
            ProcessExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("REEF_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr);
    let result = match cli.log_format {
        LogFormat::Pretty => subscriber.try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };
    // A subscriber may already be installed (e.g. repeated calls in
    // tests); that's not a reason to fail the command.
    let _ = result;
}

/// `detect [--quick] -- <input>`: exit 0 if bash-ish, 1 otherwise, no
/// stdout (spec.md §6).
fn detect_command(quick: bool, input: &str) -> Result<RawExitCode, ReefError> {
    let looks_bash = if quick {
        detector::looks_like_bash(input)
    } else {
        detector::looks_like_bash(input) || crate::parser::parse(input).is_ok()
    };
    info!(looks_bash, "detect");
    Ok(if looks_bash { 0 } else { 1 })
}

/// `translate -- <input>`: print translated source on success, nothing
/// and a non-zero exit on failure (spec.md §6).
fn translate_command(input: &str) -> Result<RawExitCode, ReefError> {
    match translate(input)? {
        Some(source) => {
            println!("{source}");
            Ok(0)
        }
        None => Ok(1),
    }
}

/// `bash-exec [--env-diff] [--state-file PATH] -- <input>` (spec.md §6).
/// Exit code mirrors the bash subprocess's own.
fn bash_exec_command(
    env_diff: bool,
    state_file: Option<&std::path::Path>,
    input: &str,
) -> Result<RawExitCode, ReefError> {
    let options = BashExecOptions { env_diff, state_file };
    let result = passthrough::bash_exec(input, &options)?;
    if !result.env_delta_script.is_empty() {
        let mut stdout = io::stdout();
        stdout.write_all(&result.env_delta_script).ok();
        stdout.write_all(b"\n").ok();
    }
    Ok(clamp_raw_exit_code(result.exit_code))
}

/// `daemon {start|stop|exec} --socket PATH [-- <input>]` (spec.md §6).
fn daemon_command(command: DaemonCommands) -> Result<RawExitCode, ReefError> {
    match command {
        DaemonCommands::Start { socket } => {
            daemon::start(&socket)?;
            Ok(0)
        }
        DaemonCommands::Stop { socket } => {
            let was_running = daemon::stop(&socket)?;
            if !was_running {
                eprintln!("reef: no daemon listening on {}", socket.display());
            }
            Ok(0)
        }
        DaemonCommands::Exec { socket, input } => {
            let result = daemon::exec(&socket, &input)?;
            let mut stdout = io::stdout();
            stdout.write_all(&result.output).ok();
            if !result.env_delta_script.is_empty() {
                stdout.write_all(&result.env_delta_script).ok();
                stdout.write_all(b"\n").ok();
            }
            Ok(clamp_raw_exit_code(result.exit_code))
        }
    }
}

/// Bash exit codes are conventionally 0-255 already, but a signal-killed
/// process can report codes outside that range through other paths; clamp
/// defensively rather than let `as u8` silently wrap in a surprising way.
fn clamp_raw_exit_code(code: i32) -> RawExitCode {
    code.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_raw_exit_code_passes_through_normal_codes() {
        assert_eq!(clamp_raw_exit_code(0), 0);
        assert_eq!(clamp_raw_exit_code(1), 1);
        assert_eq!(clamp_raw_exit_code(127), 127);
        assert_eq!(clamp_raw_exit_code(255), 255);
    }

    #[test]
    fn clamp_raw_exit_code_clamps_out_of_range_values() {
        assert_eq!(clamp_raw_exit_code(-1), 0);
        assert_eq!(clamp_raw_exit_code(300), 255);
    }
}
