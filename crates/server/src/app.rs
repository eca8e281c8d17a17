//! Router assembly.
//!
//! Shared by the binary and by tests so both exercise the same stack.

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Static assets, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/server/static";

/// Build the full application router over `session_store`.
pub fn build_router<S: SessionStore + Clone>(state: AppState, session_store: S) -> Router {
    let session_layer = create_session_layer(session_store, state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Lists projects through the configured store; 503 if that fails.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.projects().list_projects().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::config::SiteConfig;
    use crate::profile::Profile;
    use crate::store::MemoryStore;

    fn app(claude_url: &str) -> Router {
        let vars: HashMap<String, String> = [
            ("FOLIO_BASE_URL", "http://localhost:3000"),
            ("FOLIO_ADMIN_SUBJECT", "admin-uid"),
            ("CLAUDE_API_KEY", "sk-ant-REDACTED"),
            ("CLAUDE_API_URL", claude_url),
            ("OAUTH_CLIENT_ID", "client-id.apps.googleusercontent.com"),
            ("OAUTH_CLIENT_SECRET", "GOCSPX-8fJq2Lm9Vx4Rt7Kp1Wz6Nb3Yc"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = SiteConfig::from_vars(&vars).unwrap();
        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Profile::load(None).unwrap(),
        )
        .unwrap();
        build_router(state, tower_sessions::MemoryStore::default())
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app("http://127.0.0.1:9/v1/messages")
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_readiness_with_memory_store() {
        let response = app("http://127.0.0.1:9/v1/messages")
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_redirects_anonymous_to_login() {
        let response = app("http://127.0.0.1:9/v1/messages")
            .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_admin_api_rejects_anonymous_with_401() {
        let response = app("http://127.0.0.1:9/v1/messages")
            .oneshot(post_json(
                "/admin/api/tagline",
                &serde_json::json!({"title": "t", "description": "d"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ask_rejects_empty_question() {
        let response = app("http://127.0.0.1:9/v1/messages")
            .oneshot(post_json("/api/ask", &serde_json::json!({"question": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "Bad request: question cannot be empty");
    }

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "id": "msg_1",
                    "model": "claude-test",
                    "stop_reason": "end_turn",
                    "content": [{"type": "text", "text": "Aditya builds web apps."}],
                    "usage": {"input_tokens": 1, "output_tokens": 1}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let response = app(&format!("{}/v1/messages", server.url()))
            .oneshot(post_json(
                "/api/ask",
                &serde_json::json!({"question": "Who is Aditya?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["answer"], "Aditya builds web apps.");
    }

    #[tokio::test]
    async fn test_home_renders_profile() {
        let response = app("http://127.0.0.1:9/v1/messages")
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let html = body_string(response).await;
        assert!(html.contains("Aditya Raj"));
        assert!(html.contains("No projects yet."));
    }

    #[tokio::test]
    async fn test_auth_login_redirects_to_provider_with_state() {
        let response = app("http://127.0.0.1:9/v1/messages")
            .oneshot(
                Request::builder()
                    .uri("/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.starts_with("https://accounts.google.com/"));
        assert!(location.contains("state="));
        assert!(!location.contains("nonce="));
        assert!(location.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"
        ));
        assert!(response.headers().contains_key(header::SET_COOKIE));
    }
}
