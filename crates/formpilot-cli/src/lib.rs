//! Formpilot CLI Library
//!
//! Command-line front end for running per-site form rules against page
//! fixtures, validating exported rule files and inspecting backups.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod commands;
mod config;
mod error;
pub mod runner;

pub use commands::{Cli, ColorArg, Commands, FormatArg, RunArgs, SitesArgs, ValidateArgs};
pub use config::{CliConfig, ColorChoice, OutputFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use runner::RunReport;
