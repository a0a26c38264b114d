// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Serve Command
//!
//! Loads the portal configuration, wires the record store, access policy,
//! notification sender and event bus into a [`GrantWorkflow`], and serves the
//! HTTP API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use grantflow_core::application::store_factory::{create_grant_store, create_notification_sender};
use grantflow_core::application::GrantWorkflow;
use grantflow_core::domain::policy::AccessPolicy;
use grantflow_core::domain::portal_config::PortalConfigManifest;
use grantflow_core::infrastructure::event_bus::EventBus;
use grantflow_core::presentation::api;

#[derive(Args)]
pub struct ServeCommand {
    /// Bind address (overrides spec.api.bind_address)
    #[arg(long, env = "GRANTFLOW_BIND_ADDRESS")]
    pub bind: Option<String>,

    /// HTTP port (overrides spec.api.port)
    #[arg(long, env = "GRANTFLOW_PORT")]
    pub port: Option<u16>,
}

pub async fn execute(cmd: ServeCommand, config_path: Option<PathBuf>) -> Result<()> {
    let config =
        PortalConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    info!(portal = %config.metadata.name, "Configuration loaded");

    if let Some(port) = config.spec.observability.as_ref().and_then(|o| o.metrics_port) {
        install_metrics_exporter(port)?;
    }

    let store = create_grant_store(&config.storage_backend()).await?;
    let sender = create_notification_sender(&config.spec.notifications)?;
    let policy = AccessPolicy::standard(&config.spec.access.admin_overrides);
    if config.spec.notifications.staff_email.is_none() {
        warn!("No staff_email configured; submission notifications to staff are disabled");
    }

    let workflow = GrantWorkflow::new(
        store,
        policy,
        sender,
        config.spec.notifications.staff_email.clone(),
        EventBus::with_default_capacity(),
    );
    let app = api::app(workflow);

    let bind = cmd.bind.unwrap_or_else(|| config.spec.api.bind_address.clone());
    let port = cmd.port.unwrap_or(config.spec.api.port);
    let addr = format!("{}:{}", bind, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("grantflow API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("grantflow API shutting down");
    Ok(())
}

fn install_metrics_exporter(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
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
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
