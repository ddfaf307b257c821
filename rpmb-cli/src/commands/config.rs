//! Config command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use rpmb_orchestrator::{Config, ImageMap, NamespaceResolver};

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the settings in effect
    Show,
    /// Show the target OS to build image table
    Images,
}

pub fn handle_config_command(
    command: ConfigCommands,
    config: &Config,
    namespace: Option<&str>,
) -> Result<()> {
    match command {
        ConfigCommands::Show => show_config(config, namespace),
        ConfigCommands::Images => show_images(&ImageMap::default()),
    }

    Ok(())
}

fn show_config(config: &Config, namespace: Option<&str>) {
    let resolved = NamespaceResolver::from_config(config).resolve(namespace);

    println!("{}", "Configuration:".bold());
    println!("  API server:     {}", config.api_server.cyan());
    println!("  Pipeline:       {}", config.pipeline_name);
    match resolved {
        Ok(ns) => println!("  Namespace:      {}", ns.green()),
        Err(_) => println!("  Namespace:      {}", "(none selected)".yellow()),
    }
    println!("  Poll interval:  {:?}", config.poll_interval);
    println!("  Timeout:        {:?}", config.request_timeout);
    println!(
        "  Fallback paths: {}",
        config
            .fallback_base_paths
            .iter()
            .map(|p| if p.is_empty() { "/" } else { p.as_str() })
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  Token:          {}",
        if config.token.is_some() {
            "set".green()
        } else {
            "not set".dimmed()
        }
    );
    if config.accept_invalid_certs {
        println!("  {}", "⚠ TLS verification disabled".yellow());
    }
}

fn show_images(images: &ImageMap) {
    println!("{}", "Build images:".bold());
    for (os, image) in images.entries() {
        println!("  {:<16} {}", os.cyan(), image);
    }
    println!("  {:<16} {}", "(other)".dimmed(), images.default_image());
}
