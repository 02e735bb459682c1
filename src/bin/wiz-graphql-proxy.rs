use anyhow::Result;
use clap::Parser;
use tracing::info;
use wiz_graphql_proxy::config::args::CliArgs;
use wiz_graphql_proxy::server::server::{self, AppState};
use wiz_graphql_proxy::utils::{config_loader, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read flags / env and the optional YAML file
    // -------------------------------

    let args = CliArgs::parse();
    let service_config = config_loader::load(&args).await?;
    logging::init_logging(&service_config.settings.logging);

    // -------------------------------
    // 2. Refuse to start on an invalid config
    // -------------------------------

    config_loader::validate(&service_config).await?;

    // -------------------------------
    // 3. Build the token cache and upstream client once per process
    // -------------------------------

    let state = AppState::from_config(&service_config).await?;

    // -------------------------------
    // 4. Serve until ctrl-c / SIGTERM
    // -------------------------------

    info!(
        graphql_url = %service_config.upstream.graphql_url,
        auth_url = %service_config.credentials.auth_url,
        "Service starting..."
    );
    server::start(&service_config.settings, state, server::shutdown_signal()).await?;
    info!("Service stopped");
    Ok(())
}
