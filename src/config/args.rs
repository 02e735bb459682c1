use clap::Parser;

use crate::config::service::ServiceConfig;
use crate::utils::logging::LogLevel;

/// Command line flags. Every flag can also come from the environment;
/// both take precedence over the optional YAML file.
#[derive(Parser, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Optional YAML settings file
    #[arg(short, long, env = "CONFIG")]
    pub config: Option<String>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,
    #[arg(long, env = "WIZ_CLIENT_ID")]
    pub client_id: Option<String>,
    #[arg(long, env = "WIZ_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
    #[arg(long, env = "WIZ_AUTH_URL")]
    pub auth_url: Option<String>,
    #[arg(long, env = "WIZ_GRAPHQL_URL")]
    pub graphql_url: Option<String>,
    #[arg(long, env = "WIZ_AUDIENCE")]
    pub audience: Option<String>,
    #[arg(long, env = "HOST")]
    pub host: Option<String>,
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}

impl CliArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut ServiceConfig) {
        let credentials = &mut config.credentials;
        if let Some(client_id) = &self.client_id {
            credentials.client_id = Some(client_id.to_owned());
        }
        if let Some(client_secret) = &self.client_secret {
            credentials.client_secret = Some(client_secret.to_owned());
        }
        if let Some(auth_url) = &self.auth_url {
            credentials.auth_url = auth_url.to_owned();
        }
        if let Some(audience) = &self.audience {
            credentials.audience = audience.to_owned();
        }
        if let Some(graphql_url) = &self.graphql_url {
            config.upstream.graphql_url = graphql_url.to_owned();
        }
        if let Some(host) = &self.host {
            config.settings.server.host = host.to_owned();
        }
        if let Some(port) = self.port {
            config.settings.server.port = port;
        }
        if let Some(level) = self.log_level {
            config.settings.logging.level = level.as_str().to_lowercase();
        }
    }
}
