// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `disco-kernel`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "disco-kernel",
    version,
    about = "Notebook kernel that drives the Disco REPL over a line-delimited JSON protocol.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to an optional config file (TOML).
    ///
    /// Without it, built-in defaults are used (binary `disco`, prompt `Disco> `).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disco binary to launch. Overrides `repl.binary` from the config file.
    #[arg(long, value_name = "PATH")]
    pub binary: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DISCO_KERNEL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the kernel info reply as JSON and exit without starting Disco.
    #[arg(long)]
    pub print_info: bool,
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
