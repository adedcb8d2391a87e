//! orgauth HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, the organization resolver, and the HTTP
//! router, then serves the API and the metrics endpoint.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use orgauth::app::{AppState, build_router};
use orgauth::auth::credentials::EnvCredentialSource;
use orgauth::auth::github::GithubClient;
use orgauth::auth::resolver::GithubOrganizationResolver;
use orgauth::config::{ServiceConfig, StorageBackend};
use orgauth::observability;
use orgauth::service::ConfigService;
use orgauth::store::ConfigStore;
use orgauth::store::memory::InMemoryStore;
use orgauth::store::postgres::PostgresStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env_or_yaml().context("orgauth config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: ServiceConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("orgauth")?;
    let state = build_state(config.clone()).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state.clone());
    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        backend = state.service.store().backend_name(),
        "orgauth listening"
    );
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: ServiceConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn ConfigStore> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(
                PostgresStore::connect(pg)
                    .await
                    .context("connect postgres config store")?,
            )
        }
    };
    let client = GithubClient::new(Duration::from_millis(config.github.timeout_ms))
        .context("build github client")?;
    let service = ConfigService::new(
        store,
        Arc::new(GithubOrganizationResolver::new(client)),
        Arc::new(EnvCredentialSource::new(config.github.token_env)),
    );
    Ok(AppState {
        service: Arc::new(service),
    })
}
