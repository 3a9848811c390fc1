//! CLI command definitions using clap

use crate::config::{ColorChoice, OutputFormat};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Formpilot: run per-site form rules against page fixtures
#[derive(Parser, Debug)]
#[command(name = "formpilot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one pass of a site's rules against a page fixture
    Run(RunArgs),

    /// Check that a single-site rules file would import
    Validate(ValidateArgs),

    /// List the sites in a full backup
    Sites(SitesArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Rules file: a single-site array or a full backup
    #[arg(short, long)]
    pub rules: PathBuf,

    /// Page fixture (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    pub page: PathBuf,

    /// Site key to pick from a full backup (defaults to the fixture URL's hostname)
    #[arg(short, long)]
    pub site: Option<String>,

    /// Include manual rules, as an explicit "run all" does
    #[arg(short, long)]
    pub manual: bool,

    /// Engine configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Single-site rules file
    pub file: PathBuf,
}

/// Arguments for the sites command
#[derive(Parser, Debug)]
pub struct SitesArgs {
    /// Full backup file
    pub backup: PathBuf,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable summary
    #[default]
    Text,
    /// Updated rules as JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}
