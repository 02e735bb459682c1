//! GraphQL reverse proxy
//!
//! Inbound GraphQL POSTs get a bearer token from the shared [`TokenCache`] and
//! are forwarded byte-for-byte to the upstream endpoint. The upstream answer is
//! relayed as-is.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use reqwest::{Client, Url};

use crate::cache::token_cache::TokenCache;
use crate::config::service::ServiceConfig;
use crate::server::server::AppState;
use crate::sources::oauth2::{ClientCredentials, ClientCredentialsSource};
use crate::utils::constants::{DEFAULT_MAX_BODY_BYTES, ROUTE_GRAPHQL, ROUTE_HEALTH, ROUTE_INTROSPECTION};

pub mod graphql;
pub mod health;

pub type ProxyTokenCache = TokenCache<ClientCredentialsSource>;

#[derive(Clone)]
pub struct ProxyState {
    pub token_cache: ProxyTokenCache,
    pub client: Client,
    pub graphql_url: Url,
    pub upstream_timeout: Duration,
    pub max_body_bytes: usize,
}

impl ProxyState {
    pub fn new(token_cache: ProxyTokenCache, client: Client, graphql_url: Url, upstream_timeout: Duration) -> Self {
        Self {
            token_cache,
            client,
            graphql_url,
            upstream_timeout,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Wire the token cache and upstream client from a validated config.
    pub fn from_config(service_config: &ServiceConfig, client: Client) -> Result<Self> {
        let credentials = &service_config.credentials;
        let auth_url = Url::parse(&credentials.auth_url)
            .with_context(|| format!("invalid auth url '{}'", credentials.auth_url))?;
        let graphql_url = Url::parse(&service_config.upstream.graphql_url)
            .with_context(|| format!("invalid graphql url '{}'", service_config.upstream.graphql_url))?;

        let source = ClientCredentialsSource::new(
            client.clone(),
            auth_url,
            ClientCredentials {
                client_id: credentials.client_id.clone().ok_or_else(|| anyhow!("client id is not configured"))?,
                client_secret: credentials.client_secret.clone().ok_or_else(|| anyhow!("client secret is not configured"))?,
                audience: Some(credentials.audience.clone()),
            },
        );
        let token_cache = TokenCache::new(source, service_config.settings.token.cache_settings());

        Ok(Self::new(
            token_cache,
            client,
            graphql_url,
            Duration::from_millis(service_config.upstream.timeout_ms),
        )
        .with_max_body_bytes(service_config.upstream.max_body_bytes))
    }

    pub fn router(&self) -> Router<AppState> {
        Router::new()
            .route(ROUTE_GRAPHQL, post(graphql::proxy_graphql).options(graphql::preflight))
            .route(ROUTE_INTROSPECTION, post(graphql::proxy_graphql))
            .layer(DefaultBodyLimit::max(self.max_body_bytes))
            .route(ROUTE_HEALTH, get(health::health))
    }
}
