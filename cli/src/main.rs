// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Scatter-Gather Gateway CLI
//!
//! The `scatter-gather` binary runs the chat summary gateway and talks to a
//! running instance.
//!
//! ## Commands
//!
//! - `scatter-gather serve` - Run the HTTP gateway until SIGINT/SIGTERM
//! - `scatter-gather summary --user-id U --chat-id C` - Request one summary
//! - `scatter-gather config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use scatter_gather::commands::{self, ConfigCommand, ServeArgs, SummaryArgs};

/// Scatter-Gather Gateway - deadline-bounded chat summaries
#[derive(Parser)]
#[command(name = "scatter-gather")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SCATTER_GATHER_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP port (default: spec.server.port, 8080)
    #[arg(long, global = true, env = "SCATTER_GATHER_PORT")]
    port: Option<u16>,

    /// HTTP host (default: spec.server.bind_address, 127.0.0.1)
    #[arg(long, global = true, env = "SCATTER_GATHER_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SCATTER_GATHER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Request a chat summary from a running gateway
    #[command(name = "summary")]
    Summary(SummaryArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Serve(args)) => {
            commands::serve::handle_command(args, cli.config, cli.host, cli.port).await
        }
        Some(Commands::Summary(args)) => {
            commands::summary::handle_command(args, cli.config, cli.host, cli.port).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
