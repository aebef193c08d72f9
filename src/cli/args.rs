//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Inspect and exercise the driver's structured log pipeline.
#[derive(Parser, Debug)]
#[command(name = "driverlog", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress internal diagnostics.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "DRIVERLOG_COLOR")]
    pub color: ColorChoice,

    /// Format of internal diagnostics on stderr.
    #[arg(long, default_value = "human", global = true, env = "DRIVERLOG_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the effective severity ceiling of each component.
    Levels(LevelsArgs),

    /// Run a simulated command through the pipeline.
    Emit(EmitArgs),

    /// Display version and pipeline defaults.
    Version(VersionArgs),
}

// ============================================================================
// Subcommand arguments
// ============================================================================

/// Arguments for `levels`.
#[derive(Args, Debug)]
pub struct LevelsArgs {
    /// YAML settings file applied on top of the environment.
    #[arg(short, long, env = "DRIVERLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `emit`.
#[derive(Args, Debug)]
pub struct EmitArgs {
    /// YAML settings file applied on top of the environment.
    #[arg(short, long, env = "DRIVERLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Command name.
    #[arg(long, default_value = "ping")]
    pub command_name: String,

    /// Database the command runs against.
    #[arg(long, default_value = "admin")]
    pub database: String,

    /// Command body as a JSON object. Defaults to `{"<name>": 1}`.
    #[arg(long)]
    pub command: Option<String>,

    /// Reply body as a JSON object. Defaults to `{"ok": 1.0}`.
    #[arg(long)]
    pub reply: Option<String>,

    /// Report the command as failed by the server.
    #[arg(long)]
    pub fail: bool,

    /// Request id of the simulated command.
    #[arg(long, default_value_t = 1)]
    pub request_id: i32,

    /// Operation id of the simulated command.
    #[arg(long, default_value_t = 1)]
    pub operation_id: i64,

    /// Server host.
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Server port.
    #[arg(long, default_value_t = 27017)]
    pub port: u16,

    /// Simulated round-trip time in microseconds.
    #[arg(long, default_value_t = 1500)]
    pub duration_micros: i64,

    /// Print pipeline counters in Prometheus text format afterwards.
    #[arg(long)]
    pub print_metrics: bool,
}

/// Arguments for `version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Shared Enums
// ============================================================================

/// Output format for informational commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Color output control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn emit_defaults() {
        let cli = Cli::try_parse_from(["driverlog", "emit"]).unwrap();
        let Commands::Emit(args) = cli.command else {
            panic!("expected emit");
        };
        assert_eq!(args.command_name, "ping");
        assert_eq!(args.database, "admin");
        assert_eq!(args.port, 27017);
        assert!(!args.fail);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["driverlog", "levels", "-vv", "--format", "json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Levels(args) = cli.command else {
            panic!("expected levels");
        };
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn log_format_is_global() {
        let cli = Cli::try_parse_from(["driverlog", "emit", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        let cli = Cli::try_parse_from(["driverlog", "version"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Human);
        assert!(Cli::try_parse_from(["driverlog", "--log-format", "xml", "version"]).is_err());
    }
}
