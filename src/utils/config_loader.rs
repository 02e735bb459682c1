use std::path::Path;
use anyhow::{anyhow, Result};

use crate::config::args::CliArgs;
use crate::config::proc_loader::file_to_config;
use crate::config::proc_validator::validate_service_config;
use crate::config::service::ServiceConfig;

/// Build the config: optional YAML file first, flags and env on top.
pub async fn load(args: &CliArgs) -> Result<ServiceConfig> {
    let mut service_config = match &args.config {
        Some(config_path) => file_to_config(Path::new(config_path))
            .await
            .map_err(|e| anyhow!("Invalid config format: {:#}", e))?,
        None => ServiceConfig::default(),
    };
    args.apply(&mut service_config);
    Ok(service_config)
}

pub async fn validate(service_config: &ServiceConfig) -> Result<()> {
    validate_service_config(service_config).await.map_err(|errors| {
        anyhow!(
            "config is not valid, total errors: {}\n{}",
            errors.len(),
            errors.join("\n")
        )
    })
}
