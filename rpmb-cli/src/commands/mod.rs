//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod build;
mod config;

pub use build::BuildCommands;
pub use config::ConfigCommands;

use anyhow::Result;
use clap::Subcommand;
use rpmb_orchestrator::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit and follow builds
    Build {
        #[command(subcommand)]
        command: BuildCommands,
    },
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - Orchestrator configuration built from the global flags
/// * `namespace` - Namespace given with `--namespace`, if any
pub async fn handle_command(command: Commands, config: &Config, namespace: Option<&str>) -> Result<()> {
    match command {
        Commands::Build { command } => build::handle_build_command(command, config, namespace).await,
        Commands::Config { command } => config::handle_config_command(command, config, namespace),
    }
}
