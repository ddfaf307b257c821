//! RPM Builder CLI
//!
//! Command-line interface for submitting RPM builds to a Tekton-enabled
//! cluster and following them until they finish.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::GlobalArgs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rpmb")]
#[command(about = "RPM Builder CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rpmb=warn,rpmb_orchestrator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = cli.global.to_config();
    config.validate()?;
    tracing::debug!(
        api_server = %config.api_server,
        pipeline = %config.pipeline_name,
        "Configuration loaded"
    );

    handle_command(cli.command, &config, cli.global.namespace.as_deref()).await
}
