//! SCIM-to-GitHub organization membership bridge.
//!
//! Exposes a SCIM 2.0 provisioning surface to an identity provider and maps
//! each operation onto the GitHub organization-membership REST API: create
//! invites, read/list look up memberships, delete removes them. The bridge
//! itself is stateless — every operation is a live pass-through.

mod audit;
mod config;
mod directory;
mod observability;
mod routes;
mod scim;
mod services;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{Router, routing::get};
use clap::Parser;
use tokio_util::task::TaskTracker;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    audit::{AuditBuffer, AuditBufferConfig, FileSink},
    config::BridgeConfig,
    directory::GitHubDirectory,
    services::ProvisioningService,
};

/// Default config file looked up when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "scim-bridge.toml";

/// Request body cap for the SCIM surface.
const MAX_BODY_BYTES: usize = 256 * 1024;

/// CLI arguments for the SCIM bridge.
#[derive(Parser, Debug)]
#[command(version, about = "SCIM 2.0 bridge for GitHub organization membership", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (falls back to scim-bridge.toml if present,
    /// otherwise GITHUB_TOKEN/GITHUB_ORG/PORT environment variables)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the bridge server (default)
    Serve,
    /// Load and validate the configuration, print a summary, and exit
    CheckConfig,
}

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub provisioning: ProvisioningService,
}

/// Build the application router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/scim/v2", routes::scim_routes())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let (config, source) = match load_config(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = observability::init_tracing(&config.log) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    tracing::info!(source = %source, org = %config.github.org, "Configuration loaded");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::CheckConfig => {
            println!("Configuration OK ({})", source);
            println!("  organization:  {}", config.github.org);
            println!("  api base url:  {}", config.github.api_base_url);
            println!("  listen:        {}:{}", config.server.host, config.server.port);
            println!(
                "  audit:         {}",
                if config.audit.enabled {
                    &config.audit.directory
                } else {
                    "disabled"
                }
            );
        }
    }
}

/// Resolve configuration from the CLI path, the default file, or the
/// environment, in that order.
fn load_config(explicit_path: Option<&str>) -> Result<(BridgeConfig, String), config::ConfigError> {
    if let Some(path) = explicit_path {
        return Ok((BridgeConfig::from_file(path)?, path.to_string()));
    }

    if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
        return Ok((
            BridgeConfig::from_file(DEFAULT_CONFIG_PATH)?,
            DEFAULT_CONFIG_PATH.to_string(),
        ));
    }

    Ok((BridgeConfig::from_env()?, "environment".to_string()))
}

async fn run_server(config: BridgeConfig) {
    let directory = match GitHubDirectory::new(&config.github) {
        Ok(directory) => Arc::new(directory),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build GitHub client");
            std::process::exit(1);
        }
    };

    let audit_buffer = Arc::new(AuditBuffer::new(AuditBufferConfig {
        max_pending_events: config.audit.max_pending_events,
        flush_interval: std::time::Duration::from_millis(config.audit.flush_interval_ms),
        ..AuditBufferConfig::default()
    }));

    let audit_worker = if config.audit.enabled {
        let sink = Arc::new(FileSink::new(&config.audit.directory));
        let handle = audit_buffer.start_worker(sink);
        tracing::info!(directory = %config.audit.directory, "Audit log worker started");
        Some((Arc::clone(&audit_buffer), handle))
    } else {
        None
    };

    let provisioning = ProvisioningService::new(directory, audit_buffer);
    let task_tracker = TaskTracker::new();

    let app = build_app(AppState { provisioning });

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on http://{}", bind_addr);

    // Graceful shutdown: wait for SIGINT/SIGTERM, flush the audit buffer,
    // then wait for tracked background tasks
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(task_tracker, audit_worker))
        .await
        .unwrap();
}

async fn shutdown_signal(
    task_tracker: TaskTracker,
    audit_worker: Option<(Arc<AuditBuffer>, tokio::task::JoinHandle<()>)>,
) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, waiting for background tasks to complete...");

    // Close the task tracker to prevent new tasks from being spawned
    task_tracker.close();

    // Shut the audit worker down and wait for it to flush
    if let Some((buffer, handle)) = audit_worker {
        buffer.shutdown();
        if let Err(e) = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await {
            tracing::warn!(error = %e, "Timeout waiting for audit buffer to flush");
        } else {
            tracing::info!("Audit buffer flushed");
        }
    }

    let wait_result =
        tokio::time::timeout(std::time::Duration::from_secs(30), task_tracker.wait()).await;

    match wait_result {
        Ok(()) => tracing::info!("All background tasks completed"),
        Err(_) => {
            tracing::warn!("Timeout waiting for background tasks, some may not have completed")
        }
    }

    tracing::info!("Shutdown complete");
}
