// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `summary`: request one chat summary from a running gateway

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use scatter_gather_core::domain::chat::ChatSummary;
use scatter_gather_core::domain::gateway_config::GatewayConfigManifest;

use crate::gateway::{GatewayClient, SummaryOutcome};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[arg(long)]
    pub user_id: String,

    #[arg(long)]
    pub chat_id: String,

    /// Simulation override passed as a query parameter (e.g. vm_delay=3s).
    /// Only honored when the gateway allows request overrides.
    #[arg(long = "override", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,

    /// Print the raw JSON body
    #[arg(long)]
    pub json: bool,
}

fn parse_override(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => Ok((key.trim().to_string(), val.trim().to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", value)),
    }
}

pub async fn handle_command(
    args: SummaryArgs,
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let (host, port) = match (host, port) {
        (Some(host), Some(port)) => (host, port),
        (host, port) => {
            let config = GatewayConfigManifest::load_or_default(config_path)
                .context("Failed to load configuration")?;
            (
                host.unwrap_or(config.spec.server.bind_address),
                port.unwrap_or(config.spec.server.port),
            )
        }
    };

    let client = GatewayClient::for_address(&host, port)?;
    let outcome = client
        .chat_summary(&args.user_id, &args.chat_id, &args.overrides)
        .await?;

    if args.json {
        let body = match &outcome {
            SummaryOutcome::Ok(summary) | SummaryOutcome::Degraded(summary) => {
                serde_json::to_string_pretty(summary)?
            }
            SummaryOutcome::Failed(error) => {
                serde_json::to_string_pretty(&serde_json::json!({ "error": error }))?
            }
        };
        println!("{}", body);
    } else {
        print_outcome(&outcome);
    }

    if matches!(outcome, SummaryOutcome::Failed(_)) {
        std::process::exit(2);
    }
    Ok(())
}

/// Sections absent from a summary, in response order.
fn omitted(summary: &ChatSummary) -> Vec<&'static str> {
    [
        ("user", summary.user.is_none()),
        ("permissions", summary.permissions.is_none()),
        ("context", summary.context.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, missing)| missing.then_some(name))
    .collect()
}

fn print_outcome(outcome: &SummaryOutcome) {
    let summary = match outcome {
        SummaryOutcome::Ok(summary) => {
            println!("{}", "OK".green().bold());
            summary
        }
        SummaryOutcome::Degraded(summary) => {
            let omitted = omitted(summary);
            if omitted.is_empty() {
                println!("{}", "DEGRADED".yellow().bold());
            } else {
                let label = format!("(omitted: {})", omitted.join(", "));
                println!("{} {}", "DEGRADED".yellow().bold(), label.dimmed());
            }
            summary
        }
        SummaryOutcome::Failed(error) => {
            println!("{} {}", "FAILED".red().bold(), error);
            return;
        }
    };

    if let Some(user) = &summary.user {
        println!("  User: {} ({})", user.name, user.id);
    }
    if let Some(permissions) = &summary.permissions {
        println!(
            "  Access to chat {}: {}",
            permissions.chat_id,
            if permissions.allowed {
                "allowed".green()
            } else {
                "denied".red()
            }
        );
    }
    if let Some(context) = &summary.context {
        println!(
            "  Context: {} [{} in {}ms]",
            context.snippet, context.source, context.latency_ms
        );
    }
}
