// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `serve`: run the gateway in the foreground

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use scatter_gather_core::domain::gateway_config::GatewayConfigManifest;

use crate::gateway::server::start_server;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Override spec.aggregation.sla (e.g. "250ms")
    #[arg(long, value_parser = humantime_duration)]
    pub sla: Option<Duration>,

    /// Accept per-request simulation overrides on /chat/summary
    #[arg(long)]
    pub allow_overrides: bool,
}

fn humantime_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|e| e.to_string())
}

pub async fn handle_command(
    args: ServeArgs,
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config = GatewayConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    apply_args(&mut config, &args);

    let host = host.unwrap_or_else(|| config.spec.server.bind_address.clone());
    let port = port.unwrap_or(config.spec.server.port);

    start_server(config, &host, port).await
}

fn apply_args(config: &mut GatewayConfigManifest, args: &ServeArgs) {
    if let Some(sla) = args.sla {
        config.spec.aggregation.sla = sla;
    }
    if args.allow_overrides {
        config.spec.simulation.allow_request_overrides = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_manifest() {
        let mut config = GatewayConfigManifest::default();
        apply_args(
            &mut config,
            &ServeArgs {
                sla: Some(Duration::from_millis(300)),
                allow_overrides: true,
            },
        );

        assert_eq!(config.spec.aggregation.sla, Duration::from_millis(300));
        assert!(config.spec.simulation.allow_request_overrides);
    }

    #[test]
    fn test_absent_flags_keep_manifest() {
        let mut config = GatewayConfigManifest::default();
        apply_args(&mut config, &ServeArgs::default());

        assert_eq!(config.spec.aggregation.sla, Duration::from_millis(200));
        assert!(!config.spec.simulation.allow_request_overrides);
    }

    #[test]
    fn test_sla_flag_parser() {
        assert_eq!(humantime_duration("250ms"), Ok(Duration::from_millis(250)));
        assert!(humantime_duration("fast").is_err());
    }
}
