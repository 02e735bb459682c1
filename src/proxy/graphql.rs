use axum::body::Bytes;
use axum::extract::{MatchedPath, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION,
    CONTENT_TYPE,
};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, info, warn};

use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::proxy::ProxyState;
use crate::server::server::AppState;

const APPLICATION_JSON: &str = "application/json";

/// Forward a GraphQL request upstream with a cached bearer token.
pub async fn proxy_graphql(
    State(state): State<AppState>,
    matched_path: MatchedPath,
    body: Bytes,
) -> Response {
    let metrics = get_metrics().await;
    let start = get_instant();
    let route = matched_path.as_str();

    let response = forward(&state.proxy_state, body).await;

    metrics
        .proxy_requests
        .with_label_values(&[route, response.status().as_str()])
        .inc();
    metrics
        .proxy_request_duration
        .with_label_values(&[route])
        .observe(start.elapsed().as_secs_f64());
    response
}

/// CORS preflight for browser clients.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
        ],
    )
}

async fn forward(proxy: &ProxyState, body: Bytes) -> Response {
    // never forward without a token
    let token = match proxy.token_cache.get_token().await {
        Ok(token) => token,
        Err(err) => {
            error!("upstream authentication failed: {}", err);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("upstream authentication failed: {}", err),
            );
        }
    };

    info!("proxying GraphQL request upstream");
    let upstream = proxy
        .client
        .post(proxy.graphql_url.clone())
        .header(AUTHORIZATION, token.bearer())
        .header(CONTENT_TYPE, APPLICATION_JSON)
        .timeout(proxy.upstream_timeout)
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(upstream) => upstream,
        Err(err) => {
            error!("GraphQL upstream request failed: {}", err);
            return error_response(
                StatusCode::BAD_GATEWAY,
                format!("GraphQL upstream request failed: {}", err),
            );
        }
    };

    let status = upstream.status();
    if status == StatusCode::UNAUTHORIZED {
        warn!("GraphQL upstream rejected the bearer token");
        proxy.token_cache.invalidate(&token).await;
    }

    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(APPLICATION_JSON));

    match upstream.bytes().await {
        Ok(bytes) => (
            status,
            [
                (CONTENT_TYPE, content_type),
                (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            error!("failed to read GraphQL upstream response: {}", err);
            error_response(
                StatusCode::BAD_GATEWAY,
                format!("failed to read GraphQL upstream response: {}", err),
            )
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        [(ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(json!({ "error": message })),
    )
        .into_response()
}
