use std::fmt;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::sources::{IssuedToken, RefreshError, TokenSource, DEFAULT_TOKEN_LIFETIME_SECONDS};

const GRANT_TYPE: &str = "client_credentials";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client identity for the client-credentials grant.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    /// Sent as `audience` when present and non-empty.
    pub audience: Option<String>,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("audience", &self.audience)
            .finish()
    }
}

/// OAuth2 client-credentials grant against a token endpoint.
#[derive(Debug, Clone)]
pub struct ClientCredentialsSource {
    client: Client,
    auth_url: Url,
    credentials: ClientCredentials,
}

impl ClientCredentialsSource {
    pub fn new(client: Client, auth_url: Url, credentials: ClientCredentials) -> Self {
        Self {
            client,
            auth_url,
            credentials,
        }
    }

    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    fn form(&self) -> Vec<(&'static str, &str)> {
        let mut form = vec![
            ("grant_type", GRANT_TYPE),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        if let Some(audience) = self.credentials.audience.as_deref().filter(|a| !a.is_empty()) {
            form.push(("audience", audience));
        }
        form
    }
}

impl TokenSource for ClientCredentialsSource {
    async fn fetch_token(&self) -> Result<IssuedToken, RefreshError> {
        debug!(url = %self.auth_url, client_id = %self.credentials.client_id, "requesting client-credentials token");

        let response = self
            .client
            .post(self.auth_url.clone())
            .form(&self.form())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RefreshError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        parse_token_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<Value>,
}

/// Extract `access_token` and `expires_in` from a token endpoint body.
pub fn parse_token_response(body: &str) -> Result<IssuedToken, RefreshError> {
    let response: TokenResponse =
        serde_json::from_str(body).map_err(|e| RefreshError::Malformed(e.to_string()))?;

    let access_token = response
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| RefreshError::Malformed("missing access_token".to_owned()))?;

    let lifetime_seconds = match response.expires_in {
        None | Some(Value::Null) => DEFAULT_TOKEN_LIFETIME_SECONDS,
        Some(value) => lifetime_seconds(&value)?,
    };

    Ok(IssuedToken::new(access_token, Duration::from_secs(lifetime_seconds)))
}

fn lifetime_seconds(value: &Value) -> Result<u64, RefreshError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| RefreshError::Malformed(format!("invalid expires_in: {}", value)))
}

fn truncate(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn source(server: &MockServer, audience: Option<&str>) -> ClientCredentialsSource {
        ClientCredentialsSource::new(
            Client::new(),
            Url::parse(&server.url("/oauth/token")).unwrap(),
            ClientCredentials {
                client_id: "client-1".to_owned(),
                client_secret: "s3cret".to_owned(),
                audience: audience.map(str::to_owned),
            },
        )
    }

    #[tokio::test]
    async fn posts_form_encoded_grant() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/oauth/token")
                    .form_urlencoded_tuple("grant_type", "client_credentials")
                    .form_urlencoded_tuple("client_id", "client-1")
                    .form_urlencoded_tuple("client_secret", "s3cret")
                    .form_urlencoded_tuple("audience", "wiz-api");
                then.status(200)
                    .json_body(json!({"access_token": "tok-1", "expires_in": 120, "token_type": "Bearer"}));
            })
            .await;

        let issued = source(&server, Some("wiz-api")).fetch_token().await.unwrap();

        mock.assert_async().await;
        assert_eq!(issued.access_token.as_str(), "tok-1");
        assert_eq!(issued.expires_in, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(401).body("invalid_client");
            })
            .await;

        let err = source(&server, None).fetch_token().await.unwrap_err();
        assert_eq!(
            err,
            RefreshError::Status {
                status: 401,
                body: "invalid_client".to_owned()
            }
        );
    }

    #[test]
    fn missing_expires_in_defaults_to_an_hour() {
        let issued = parse_token_response(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(issued.expires_in, Duration::from_secs(DEFAULT_TOKEN_LIFETIME_SECONDS));
    }

    #[test]
    fn expires_in_may_be_a_string() {
        let issued = parse_token_response(r#"{"access_token":"abc","expires_in":"90"}"#).unwrap();
        assert_eq!(issued.expires_in, Duration::from_secs(90));
    }

    #[test]
    fn rejects_bodies_without_token() {
        assert!(matches!(
            parse_token_response(r#"{"expires_in":90}"#),
            Err(RefreshError::Malformed(_))
        ));
        assert!(matches!(
            parse_token_response(r#"{"access_token":""}"#),
            Err(RefreshError::Malformed(_))
        ));
        assert!(matches!(parse_token_response("<html>"), Err(RefreshError::Malformed(_))));
        assert!(matches!(
            parse_token_response(r#"{"access_token":"abc","expires_in":"soon"}"#),
            Err(RefreshError::Malformed(_))
        ));
    }

    #[test]
    fn client_secret_is_not_debug_printed() {
        let creds = ClientCredentials {
            client_id: "id".into(),
            client_secret: "hunter2".into(),
            audience: None,
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
