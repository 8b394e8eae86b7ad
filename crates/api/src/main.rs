use anyhow::Context;

use spendlens_api::app::{build_app, services::build_services};
use spendlens_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    spendlens_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let (services, store) = build_services(&config)
        .await
        .context("failed to initialise services")?;

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
