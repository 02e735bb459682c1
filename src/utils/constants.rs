//! Shared constants and defaults

pub const DEFAULT_AUTH_URL: &str = "https://auth.app.wiz.io/oauth/token";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.us48.app.wiz.io/graphql";
pub const DEFAULT_AUDIENCE: &str = "wiz-api";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Routes served by the proxy
pub const ROUTE_GRAPHQL: &str = "/graphql";
pub const ROUTE_INTROSPECTION: &str = "/introspection";
pub const ROUTE_HEALTH: &str = "/health";
