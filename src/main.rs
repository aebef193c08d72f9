//! `driverlog`: inspect and exercise the structured log pipeline

use clap::Parser;

use driverlog::cli::args::Cli;
use driverlog::cli::commands;
use driverlog::error::ExitCode;
use driverlog::observability::init_logging;

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
