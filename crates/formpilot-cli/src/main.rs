//! Formpilot CLI: run form rules against page fixtures
//!
//! ## Usage
//!
//! ```bash
//! formpilot run --rules example.com_rules.json --page checkout.yaml
//! formpilot run --rules backup.json --page checkout.yaml --manual --format json
//! formpilot validate example.com_rules.json
//! formpilot sites backup.json
//! ```

use clap::Parser;
use formpilot_cli::{runner, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);

    init_tracing(config.verbosity);
    console::set_colors_enabled(config.color.should_color());

    match cli.command {
        Commands::Run(args) => runner::run(&config, &args),
        Commands::Validate(args) => runner::validate(&config, &args),
        Commands::Sites(args) => runner::sites(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    let color: ColorChoice = cli.color.into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

/// Logs go to stderr
fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter())),
        )
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
