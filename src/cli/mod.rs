//! CLI command definitions for site-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Resolve, persist and watch the site configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Site root containing site.config.yaml (default: $SITE_CONFIG_ROOT or .)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Directory for site.data.json (default: $SITE_CONFIG_BUILD_DIR or <root>/build)
    #[arg(short, long, global = true)]
    pub build_dir: Option<PathBuf>,

    /// Complete YAML configuration replacing the built-in defaults
    #[arg(short, long, global = true)]
    pub defaults: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve once and write the artifact (default if no subcommand given)
    Build,

    /// Resolve, write the artifact, then reload on every input change
    Dev(DevArgs),

    /// Resolve and print the result without writing the artifact
    Show(ShowArgs),

    /// Print the default configuration as YAML
    Defaults,
}

/// Arguments for the `dev` command
#[derive(Args, Debug)]
pub struct DevArgs {
    /// Debounce window for file events, in milliseconds
    #[arg(long, default_value_t = 300)]
    pub debounce_ms: u64,
}

/// Output format for `show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ShowFormat {
    /// Pretty JSON, identical to the artifact
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Arguments for the `show` command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = ShowFormat::Json)]
    pub format: ShowFormat,

    /// Print only the value at this dotted path
    #[arg(long)]
    pub path: Option<String>,
}
