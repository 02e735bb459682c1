#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use crate::config::args::CliArgs;
    use crate::config::proc_loader::{file_to_config, parse_config};
    use crate::config::proc_validator::validate_service_config;
    use crate::config::service::ServiceConfig;
    use crate::utils::config_loader;

    fn valid_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.credentials.client_id = Some("id".into());
        config.credentials.client_secret = Some("secret".into());
        config
    }

    async fn load_and_validate(args: &CliArgs) -> anyhow::Result<ServiceConfig> {
        let config = config_loader::load(args).await?;
        config_loader::validate(&config).await?;
        Ok(config)
    }

    #[tokio::test]
    #[serial]
    async fn deploy_sample_config_is_valid() {
        let config = file_to_config(std::path::Path::new("deploy/wiz-graphql-proxy.yaml"))
            .await
            .expect("deploy/wiz-graphql-proxy.yaml must exist in repo root for tests");

        assert!(config.credentials.client_id.is_none());
        assert_eq!(config.settings.token.retry.attempts, 3);
        assert!(config.settings.metrics.is_enabled);
        assert_eq!(config.upstream.max_body_bytes, 32 * 1024 * 1024);
    }

    #[tokio::test]
    #[serial]
    async fn deploy_sample_keeps_secrets_verbatim() {
        use clap::Parser;

        for secret in ["*Ab3x", "&anchor", "!tag", "@at", "abc #def", "null"] {
            std::env::set_var("WIZ_CLIENT_ID", "sample-id");
            std::env::set_var("WIZ_CLIENT_SECRET", secret);
            let args = CliArgs::try_parse_from(["wiz-graphql-proxy", "--config", "deploy/wiz-graphql-proxy.yaml"]);
            std::env::remove_var("WIZ_CLIENT_ID");
            std::env::remove_var("WIZ_CLIENT_SECRET");

            let config = load_and_validate(&args.unwrap()).await.unwrap();
            assert_eq!(config.credentials.client_id.as_deref(), Some("sample-id"));
            assert_eq!(config.credentials.client_secret.as_deref(), Some(secret));
        }
    }

    #[tokio::test]
    async fn defaults_with_credentials_are_valid() {
        validate_service_config(&valid_config()).await.unwrap();
    }

    #[tokio::test]
    async fn missing_credentials_are_reported_together() {
        let errors = validate_service_config(&ServiceConfig::default()).await.unwrap_err();

        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("WIZ_CLIENT_ID")));
        assert!(errors.iter().any(|e| e.contains("WIZ_CLIENT_SECRET")));
    }

    #[tokio::test]
    async fn blank_credentials_count_as_missing() {
        let mut config = valid_config();
        config.credentials.client_id = Some("   ".into());
        config.credentials.client_secret = Some(String::new());

        let errors = validate_service_config(&config).await.unwrap_err();
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[tokio::test]
    async fn invalid_config_reports_all_errors() {
        let invalid_yaml = r#"
settings:
  server:
    host: ""
  metrics:
    is_enabled: true
    path: /graphql
  logging:
    level: verbose
  token:
    refresh_timeout_ms: 0
    retry:
      attempts: 0
      base_delay_ms: 500
      max_delay_ms: 100
credentials:
  client_id: id
  client_secret: secret
  auth_url: "ftp://auth.example.com/token"
upstream:
  graphql_url: "not a url"
  timeout_ms: 0
  max_body_bytes: 0
"#;
        let config = parse_config(invalid_yaml.to_string()).await.unwrap();
        let errors = validate_service_config(&config).await.unwrap_err();

        let expect = |needle: &str| {
            assert!(
                errors.iter().any(|e| e.contains(needle)),
                "expected an error containing '{needle}', got {errors:?}"
            )
        };
        expect("settings.server.host");
        expect("collides with a proxy route");
        expect("settings.logging.level");
        expect("refresh_timeout_ms");
        expect("attempts must be > 0");
        expect("max_delay_ms");
        expect("must use http or https");
        expect("upstream.graphql_url");
        expect("upstream.timeout_ms");
        expect("upstream.max_body_bytes");
    }

    #[tokio::test]
    async fn non_numeric_port_is_a_parse_error() {
        let result = parse_config("settings:\n  server:\n    port: not-a-port\n".to_string()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[serial]
    async fn loader_layers_flags_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
settings:
  server:
    port: 7000
credentials:
  client_id: file-id
  client_secret: file-secret
"#
        )
        .unwrap();

        let args = CliArgs {
            config: Some(file.path().to_string_lossy().into_owned()),
            client_secret: Some("flag-secret".into()),
            ..CliArgs::default()
        };

        let config = load_and_validate(&args).await.unwrap();
        assert_eq!(config.credentials.client_id.as_deref(), Some("file-id"));
        assert_eq!(config.credentials.client_secret.as_deref(), Some("flag-secret"));
        assert_eq!(config.settings.server.port, 7000);
    }

    #[tokio::test]
    #[serial]
    async fn loader_refuses_to_start_without_credentials() {
        let err = load_and_validate(&CliArgs::default()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("config is not valid"));
        assert!(message.contains("client_id"));
    }

    #[tokio::test]
    #[serial]
    async fn credentials_come_from_environment() {
        use clap::Parser;

        std::env::set_var("WIZ_CLIENT_ID", "env-id");
        std::env::set_var("WIZ_CLIENT_SECRET", "env-secret");
        std::env::set_var("WIZ_GRAPHQL_URL", "http://127.0.0.1:4000/graphql");
        let args = CliArgs::try_parse_from(["wiz-graphql-proxy"]);
        std::env::remove_var("WIZ_CLIENT_ID");
        std::env::remove_var("WIZ_CLIENT_SECRET");
        std::env::remove_var("WIZ_GRAPHQL_URL");

        let config = load_and_validate(&args.unwrap()).await.unwrap();
        assert_eq!(config.credentials.client_id.as_deref(), Some("env-id"));
        assert_eq!(config.credentials.client_secret.as_deref(), Some("env-secret"));
        assert_eq!(config.upstream.graphql_url, "http://127.0.0.1:4000/graphql");
        assert_eq!(config.credentials.auth_url, "https://auth.app.wiz.io/oauth/token");
    }
}
