mod auth;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use tablegate_adapter_pg::{PgStore, PgStoreOptions};
use tablegate_mcp::{HttpTransportState, McpServer, create_router};
use tablegate_policy::{PolicyEngine, PolicyLoadError};
use tablegate_runtime::ExecutionGateway;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log_level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let policy_source = config
        .policy
        .resolve_source()
        .ok_or(PolicyLoadError::Missing)?;
    let policy = PolicyEngine::load(&policy_source).context("failed to load policy")?;

    let database_url = config
        .store
        .resolve_url()
        .ok_or_else(|| anyhow!("no store URL configured (store.database_url or store.database_url_env)"))?;
    let store = PgStore::connect_lazy(
        &database_url,
        PgStoreOptions {
            max_connections: config.store.max_connections,
            acquire_timeout: Duration::from_secs(config.store.acquire_timeout_seconds),
        },
    )?;

    let identity = auth::identity_provider(&config.auth).context("failed to configure identity")?;

    let gateway = ExecutionGateway::new(Arc::new(policy), Arc::new(store), config.guardrails);
    let state = HttpTransportState::new(McpServer::new(gateway), identity)
        .with_service_name(config.app_name.clone())
        .with_keepalive_interval(Duration::from_secs(config.server.keepalive_interval_secs));

    let app = create_router(Arc::new(state)).layer(TraceLayer::new_for_http());

    tracing::info!(
        app = %config.app_name,
        auth_mode = ?config.auth.mode,
        max_select_limit = config.guardrails.max_select_limit,
        "tablegate-server starting"
    );

    tablegate_mcp::serve(&config.server.bind, app, shutdown_signal()).await?;

    tracing::info!("tablegate-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
