use std::process::ExitCode;

use clap::Parser;
use storefront_e2e::cli::commands::{cmd_list, cmd_lookup, cmd_run};
use storefront_e2e::cli::config::{Cli, Commands, load_config};
use storefront_e2e::error::SuiteResult;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {}", e);
            if e.is_fatal() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

fn run(cli: Cli) -> SuiteResult<bool> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            scenarios,
            only,
            tag,
            format,
            output,
        } => cmd_run(
            &config,
            scenarios.as_deref(),
            &only,
            &tag,
            format.as_deref(),
            output.as_deref(),
        ),
        Commands::List { scenarios } => cmd_list(&config, scenarios.as_deref()).map(|_| true),
        Commands::Lookup { sku } => cmd_lookup(&config, &sku).map(|_| true),
    }
}
