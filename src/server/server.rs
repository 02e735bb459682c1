use std::future::Future;

use anyhow::{Context, Result};
use axum::Router;
use reqwest::Client;
use tracing::info;

use crate::config::service::ServiceConfig;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::proxy::ProxyState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub proxy_state: ProxyState,
}

impl AppState {
    pub fn new(metrics: &Metrics, proxy_state: ProxyState) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            proxy_state,
        }
    }

    /// Build the shared state once per process from a validated config.
    pub async fn from_config(service_config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        let proxy_state = ProxyState::from_config(service_config, client)?;
        Ok(Self::new(get_metrics().await, proxy_state))
    }
}

pub fn router(settings_config: &SettingsConfig, state: AppState) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.proxy_state.router())
        .with_state(state)
}

/// Serve the proxy until `shutdown` resolves.
pub async fn start<F>(settings_config: &SettingsConfig, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics = get_metrics().await;
    let app = router(settings_config, state);

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    metrics.up.set(1);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server failed");
    metrics.up.set(0);
    served
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
