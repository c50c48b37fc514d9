//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// calib-sync - Multi-camera calibration dataset synchronization
#[derive(Parser, Debug)]
#[command(
    name = "calib-sync",
    author,
    version,
    about = "Multi-camera calibration dataset synchronization",
    long_about = "Synchronizes per-camera calibration target detections.\n\n\
                  Loads each camera's detection directory, keeps the timestamps \n\
                  every camera observed, restricts each record to the features \n\
                  all cameras saw and dispatches the bundles to configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CALIB_SYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CALIB_SYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, synchronize and dispatch a calibration dataset
    Sync(SyncArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `sync` command
#[derive(Parser, Debug, Clone)]
pub struct SyncArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "dataset.toml",
        env = "CALIB_SYNC_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the synchronization mode from configuration
    #[arg(long, value_enum, env = "CALIB_SYNC_MODE")]
    pub mode: Option<ModeArg>,

    /// Also load records whose detection failed
    #[arg(long)]
    pub include_undetected: bool,

    /// Validate configuration and exit without loading data
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CALIB_SYNC_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "dataset.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "dataset.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show calibration target details
    #[arg(long)]
    pub target: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Synchronization mode override
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Two cameras, empty intersections dropped
    Paired,
    /// Two cameras, empty intersections kept
    ExtractCommon,
    /// Any number of cameras
    Multi,
}

impl From<ModeArg> for contracts::SyncMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Paired => Self::Paired,
            ModeArg::ExtractCommon => Self::ExtractCommon,
            ModeArg::Multi => Self::Multi,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync() {
        let cli = Cli::parse_from([
            "calib-sync",
            "-v",
            "sync",
            "--config",
            "rig.toml",
            "--mode",
            "extract-common",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.config, PathBuf::from("rig.toml"));
                assert_eq!(args.mode, Some(ModeArg::ExtractCommon));
                assert!(!args.include_undetected);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["calib-sync", "-q", "-v", "info"]).is_err());
    }
}
