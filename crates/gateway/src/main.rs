//! Envelope gateway binary entry point.
//!
//! Startup sequence:
//! 1. Load [`Settings`](config::Settings) from the environment, then load or
//!    create the persisted key file, and validate both.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP).
//! 3. Build the backend client with its bounded timeout.
//! 4. Build the Axum router and serve until Ctrl-C / SIGTERM.

mod backend;
mod config;
mod crypto;
mod server;
mod telemetry;

#[cfg(test)]
mod testutil;

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use backend::BackendClient;
use config::Config;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let (cfg, generated_key) = Config::load().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(
        &cfg.settings.log_level,
        cfg.settings.otel_exporter_otlp_endpoint.as_deref(),
    )?;
    info!(version = env!("CARGO_PKG_VERSION"), "gateway starting");

    if let Some(key) = generated_key {
        // Printed once, outside the tracing pipeline, so it never reaches
        // log storage or the span exporter.
        println!("Generated shared key: {key}");
        println!("Share this key with callers out-of-band; it will not be shown again.");
        info!(config_path = %cfg.settings.config_path, "created configuration file with a new shared key");
    }

    // -----------------------------------------------------------------------
    // 3. Backend client
    // -----------------------------------------------------------------------
    let timeout = Duration::from_secs(cfg.settings.backend_timeout_secs);
    let backend = BackendClient::new(&cfg.backend_url, timeout)?;

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let ip: IpAddr = cfg
        .settings
        .bind_addr
        .parse()
        .context("BIND_ADDR is not an IP address")?;
    let addr = SocketAddr::new(ip, cfg.listen_port);
    let routes = cfg.settings.routes();

    info!(
        addr = %addr,
        backend = %cfg.backend_url,
        key_fingerprint = %cfg.key_fingerprint,
        prefix = %cfg.settings.api_prefix,
        routes = ?routes,
        timeout_secs = cfg.settings.backend_timeout_secs,
        "listening"
    );

    let state = AppState::new(cfg.key, cfg.key_fingerprint, backend, cfg.settings.api_prefix);
    let router = server::router::build(state, &routes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    telemetry::shutdown_telemetry();
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
