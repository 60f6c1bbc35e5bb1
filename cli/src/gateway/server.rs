// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gateway HTTP server bootstrap

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use scatter_gather_core::application::chat_summary::ChatSummaryService;
use scatter_gather_core::domain::gateway_config::GatewayConfigManifest;
use scatter_gather_core::infrastructure::simulated::SimulationProfile;
use scatter_gather_core::presentation::api::{app, AppState};

/// Builds the router state from a validated manifest.
pub fn build_state(config: &GatewayConfigManifest) -> Result<AppState> {
    let dependencies = &config.spec.dependencies;
    let profile = SimulationProfile::from(dependencies);

    let service = ChatSummaryService::new(
        profile.build(),
        dependencies.criticality(),
        config.spec.aggregation.sla,
    )
    .context("Failed to create chat summary service")?;

    let state = AppState::new(Arc::new(service));
    if config.spec.simulation.allow_request_overrides {
        warn!("Per-request simulation overrides are enabled");
        return Ok(state.with_request_overrides(profile));
    }
    Ok(state)
}

pub async fn start_server(config: GatewayConfigManifest, host: &str, port: u16) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    if let Some(metrics_port) = config.spec.observability.as_ref().and_then(|o| o.metrics_port) {
        install_metrics_exporter(host, metrics_port)?;
    }

    let router = app(build_state(&config)?);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        "Gateway '{}' listening on {} (sla={:?})",
        config.metadata.name, addr, config.spec.aggregation.sla
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Gateway shutting down");

    Ok(())
}

fn install_metrics_exporter(host: &str, port: u16) -> Result<()> {
    let addr: std::net::SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid metrics address {}:{}", host, port))?;

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
