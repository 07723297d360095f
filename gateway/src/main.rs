mod app;
mod config;
mod errors;
mod logging;
mod metrics;

use clap::{Parser, Subcommand};
use config::Config;
use errors::GatewayError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "HTTP handlers behind the demo dashboard")]
struct Cli {
    /// YAML config file. Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Clone, Copy, PartialEq)]
enum CliCommand {
    /// Serve over plain HTTP on the configured listener
    Serve,
    /// Run inside the AWS Lambda runtime behind API Gateway
    Lambda,
}

fn main() -> Result<(), GatewayError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.validate()?;

    // Sentry has to be up before the runtime starts
    let _sentry = logging::init(&config.logging, cli.command == CliCommand::Lambda);

    if let Some(metrics_config) = &config.metrics {
        metrics::init(metrics_config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match cli.command {
            CliCommand::Serve => app::serve(config).await,
            CliCommand::Lambda => app::run_lambda(config).await,
        }
    })
}
