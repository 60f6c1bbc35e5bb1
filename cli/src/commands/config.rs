// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use scatter_gather_core::domain::dependency::Criticality;
use scatter_gather_core::domain::gateway_config::{
    DependencySettings, GatewayConfigManifest, CONFIG_PATH_ENV,
};

const MINIMAL_TEMPLATE: &str = include_str!("../../templates/gateway-config-minimal.yaml");
const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/gateway-config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./scatter-gather.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GatewayConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./scatter-gather.yaml");
        println!("  4. ~/.scatter-gather/config.yaml");
        println!("  5. /etc/scatter-gather/config.yaml");
        println!();
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Gateway:".bold());
    println!("  Name: {}", config.metadata.name);
    println!("  Listen: {}:{}", spec.server.bind_address, spec.server.port);
    println!("  SLA: {}", format_ms(spec.aggregation.sla));
    println!(
        "  Request overrides: {}",
        if spec.simulation.allow_request_overrides {
            "enabled".yellow()
        } else {
            "disabled".normal()
        }
    );
    println!();

    let criticality = spec.dependencies.criticality();
    println!("{}", "Dependencies:".bold());
    print_dependency("user", criticality.user, &spec.dependencies.user);
    print_dependency(
        "permissions",
        criticality.permissions,
        &spec.dependencies.permissions.settings,
    );
    println!("    allowed: {}", spec.dependencies.permissions.allowed);
    print_dependency(
        "vector_memory",
        criticality.vector_memory,
        &spec.dependencies.vector_memory,
    );
    println!();

    if let Some(observability) = &spec.observability {
        println!("{}", "Observability:".bold());
        println!("  Log level: {}", observability.log_level);
        match observability.metrics_port {
            Some(port) => println!("  Metrics port: {}", port),
            None => println!("  Metrics port: {}", "(disabled)".dimmed()),
        }
        println!();
    }

    Ok(())
}

fn print_dependency(name: &str, criticality: Criticality, settings: &DependencySettings) {
    let label = match criticality {
        Criticality::Critical => criticality.as_str().red(),
        Criticality::BestEffort => criticality.as_str().cyan(),
    };
    println!(
        "  {} [{}] latency={}{}",
        name.bold(),
        label,
        format_ms(settings.latency),
        if settings.fail { " fail=true" } else { "" }
    );
}

fn format_ms(duration: std::time::Duration) -> String {
    format!("{}ms", duration.as_millis())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GatewayConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
