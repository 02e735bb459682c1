//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Credentials must be present, URLs must be absolute http(s)
//! - Timeouts, retry and logging invariants
//! - Metrics path must not shadow a proxy route

use reqwest::Url;
use tracing::{error, info};

use crate::config::service::{CredentialsConfig, ServiceConfig, UpstreamConfig};
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;
use crate::utils::constants::{ROUTE_GRAPHQL, ROUTE_HEALTH, ROUTE_INTROSPECTION};

const MAX_REFRESH_SKEW_SECONDS: u64 = 60 * 60 * 24;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_credentials(&cfg.credentials, &mut errors);
    validate_upstream(&cfg.upstream, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }

    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }
    if metrics.is_enabled && [ROUTE_GRAPHQL, ROUTE_INTROSPECTION, ROUTE_HEALTH].contains(&metrics.path.as_str()) {
        errors.push(format!(
            "settings.metrics.path '{}' collides with a proxy route",
            metrics.path
        ));
    }

    let valid = ["trace", "debug", "info", "warn", "error"];
    if !valid.contains(&settings.logging.level.to_lowercase().as_str()) {
        errors.push(format!(
            "settings.logging.level '{}' invalid; allowed: {:?}",
            settings.logging.level, valid
        ));
    }

    let token = &settings.token;
    if token.refresh_timeout_ms == 0 {
        errors.push("settings.token.refresh_timeout_ms must be > 0".to_string());
    }
    if token.refresh_skew_seconds > MAX_REFRESH_SKEW_SECONDS {
        errors.push(format!(
            "settings.token.refresh_skew_seconds ({}) is unreasonably large",
            token.refresh_skew_seconds
        ));
    }
    validate_retry("settings.token.retry", &token.retry, errors);
}

fn validate_retry(path: &str, retry: &RetrySettings, errors: &mut Vec<String>) {
    if retry.attempts == 0 {
        errors.push(format!("{}.attempts must be > 0", path));
    }
    if retry.max_delay_ms < retry.base_delay_ms {
        errors.push(format!(
            "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
            path, retry.max_delay_ms, retry.base_delay_ms
        ));
    }
}

fn validate_credentials(credentials: &CredentialsConfig, errors: &mut Vec<String>) {
    if is_blank(&credentials.client_id) {
        errors.push("credentials.client_id is required (WIZ_CLIENT_ID)".to_string());
    }
    if is_blank(&credentials.client_secret) {
        errors.push("credentials.client_secret is required (WIZ_CLIENT_SECRET)".to_string());
    }
    validate_http_url("credentials.auth_url", &credentials.auth_url, errors);
}

fn validate_upstream(upstream: &UpstreamConfig, errors: &mut Vec<String>) {
    validate_http_url("upstream.graphql_url", &upstream.graphql_url, errors);
    if upstream.timeout_ms == 0 {
        errors.push("upstream.timeout_ms must be > 0".to_string());
    }
    if upstream.max_body_bytes == 0 {
        errors.push("upstream.max_body_bytes must be > 0".to_string());
    }
}

fn validate_http_url(path: &str, raw: &str, errors: &mut Vec<String>) {
    match Url::parse(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "{} '{}' must use http or https, got '{}'",
            path,
            raw,
            url.scheme()
        )),
        Err(err) => errors.push(format!("{} '{}' is not a valid URL: {}", path, raw, err)),
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}
