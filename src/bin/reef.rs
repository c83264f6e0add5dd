use clap::Parser;
use reef::cli::{execute_command, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    execute_command(cli)
}
