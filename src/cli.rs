// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::pipeline::Disposition;
use crate::watch::TriggerCategory;

/// Command-line arguments for `dirwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dirwatch",
    version,
    about = "Watch directories and move processed files into dated out/error trees.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Ignored when `--path` is given.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Watch a single directory instead of the targets from the config file.
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Name globs for `--path`, separated by `,`, `;` or `|`.
    #[arg(long, value_name = "GLOBS", requires = "path")]
    pub filter: Option<String>,

    /// Watch subdirectories of `--path` too.
    #[arg(long, requires = "path")]
    pub recursive: bool,

    /// Trigger categories for `--path` (repeatable). Defaults to all.
    #[arg(long = "trigger", value_enum, value_name = "CATEGORY", requires = "path")]
    pub triggers: Vec<TriggerCategory>,

    /// What to do with files created under `--path`.
    #[arg(long, value_enum, value_name = "DISPOSITION", default_value = "none")]
    pub on_created: Disposition,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DIRWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the watch targets, then exit without watching.
    #[arg(long)]
    pub dry_run: bool,
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
