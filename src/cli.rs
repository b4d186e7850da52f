// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `modeljob`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "modeljob",
    version,
    about = "Plan model build jobs and drive their validity and lifecycle checks.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Modeljob.toml` in the current working directory.
    #[arg(long, global = true, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MODELJOB_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the planned step DAG of every job in execution order.
    Plan,

    /// Evaluate whether jobs should commit suicide against current metadata.
    Check {
        /// Only check this job.
        #[arg(long, value_name = "ID")]
        job: Option<String>,
    },

    /// Replay the `[[event]]` list through the lifecycle engine.
    Replay,

    /// Run the metadata cleaners of a project.
    Gc {
        #[arg(long, value_name = "PROJECT")]
        project: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
