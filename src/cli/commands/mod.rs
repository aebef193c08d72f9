//! CLI command dispatch and handlers.

pub mod emit;
pub mod levels;
pub mod version;

use crate::cli::args::{Cli, Commands};
use crate::error::DriverLogError;

/// Dispatch a parsed CLI invocation to its handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), DriverLogError> {
    match cli.command {
        Commands::Levels(args) => levels::run(&args),
        Commands::Emit(args) => emit::run(&args),
        Commands::Version(args) => version::run(&args),
    }
}
