//! Integration test support for Folio.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (memory store, mocked Claude and identity provider)
//! cargo test -p folio-integration-tests
//!
//! # Including PostgreSQL tests
//! FOLIO_DATABASE_URL=postgres://... cargo test -p folio-integration-tests -- --ignored
//! ```
//!
//! [`TestApp`] runs the real router in-process. Claude and the identity
//! provider are a single mockito server; sign-in goes through the actual
//! `/auth/login` and `/auth/callback` handlers.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;

use async_trait::async_trait;
use folio_core::{Project, ProjectDraft, ProjectId};
use folio_server::config::SiteConfig;
use folio_server::profile::Profile;
use folio_server::state::AppState;
use folio_server::store::{MemoryStore, ProjectStore, StoreError};

/// Subject configured as the admin in every [`TestApp`].
pub const ADMIN_SUBJECT: &str = "admin-uid";

/// A status, headers and body read in full.
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body: String,
}

impl TestResponse {
    async fn read(response: Response) -> Self {
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        Self {
            status,
            location,
            set_cookie,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// A memory store whose reads can be switched to fail, as during an outage.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    reads_fail: Arc<AtomicBool>,
}

#[async_trait]
impl ProjectStore for FlakyStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store unavailable".to_string()));
        }
        self.inner.list().await
    }

    async fn create(&self, draft: ProjectDraft) -> Result<Project, StoreError> {
        self.inner.create(draft).await
    }

    async fn update(&self, id: &ProjectId, draft: ProjectDraft) -> Result<(), StoreError> {
        self.inner.update(id, draft).await
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}

/// The full router over a memory store, with external services mocked.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub server: mockito::ServerGuard,
    reads_fail: Arc<AtomicBool>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_store(MemoryStore::new()).await
    }

    pub async fn with_store(store: MemoryStore) -> Self {
        let server = mockito::Server::new_async().await;
        let url = server.url();

        let vars: HashMap<String, String> = [
            ("FOLIO_BASE_URL", "http://localhost:3000".to_string()),
            ("FOLIO_ADMIN_SUBJECT", ADMIN_SUBJECT.to_string()),
            (
                "CLAUDE_API_KEY",
                "sk-ant-REDACTED".to_string(),
            ),
            ("CLAUDE_API_URL", format!("{url}/v1/messages")),
            (
                "OAUTH_CLIENT_ID",
                "client-id.apps.googleusercontent.com".to_string(),
            ),
            (
                "OAUTH_CLIENT_SECRET",
                "GOCSPX-8fJq2Lm9Vx4Rt7Kp1Wz6Nb3Yc".to_string(),
            ),
            ("OAUTH_AUTHORIZE_URL", format!("{url}/authorize")),
            ("OAUTH_TOKEN_URL", format!("{url}/token")),
            ("OAUTH_USERINFO_URL", format!("{url}/userinfo")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let config = SiteConfig::from_vars(&vars).unwrap();
        let store = Arc::new(store);
        let reads_fail = Arc::new(AtomicBool::new(false));
        let backend = FlakyStore {
            inner: store.clone(),
            reads_fail: reads_fail.clone(),
        };
        let state = AppState::new(config, Arc::new(backend), Profile::load(None).unwrap()).unwrap();
        let router = folio_server::build_router(state, tower_sessions::MemoryStore::default());

        Self {
            router,
            store,
            server,
            reads_fail,
        }
    }

    /// Make every `list` the app performs fail until switched back.
    pub fn fail_reads(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        TestResponse::read(self.router.clone().oneshot(request).await.unwrap()).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: &serde_json::Value,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(
            builder
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
    }

    /// Sign in as `subject` through the OAuth routes; returns the session
    /// cookie and where the callback redirected.
    pub async fn sign_in(&mut self, subject: &str) -> (String, String) {
        let token = format!("token-{subject}");
        let code = format!("code-{subject}");

        self.server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::UrlEncoded("code".into(), code.clone()))
            .with_status(200)
            .with_body(serde_json::json!({"access_token": token, "token_type": "Bearer"}).to_string())
            .create_async()
            .await;
        self.server
            .mock("GET", "/userinfo")
            .match_header("authorization", format!("Bearer {token}").as_str())
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "sub": subject,
                    "name": format!("User {subject}"),
                    "email": format!("{subject}@example.com")
                })
                .to_string(),
            )
            .create_async()
            .await;

        let login = self.get("/auth/login", None).await;
        let location = login.location.unwrap();
        let state = location
            .split("state=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap()
            .to_string();
        let cookie = login.set_cookie.unwrap();

        let callback = self
            .get(
                &format!("/auth/callback?code={code}&state={state}"),
                Some(&cookie),
            )
            .await;
        let cookie = callback.set_cookie.unwrap_or(cookie);
        (cookie, callback.location.unwrap())
    }

    /// Mock one Claude reply with plain text.
    pub async fn mock_claude_text(&mut self, text: &str) -> mockito::Mock {
        self.server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "id": "msg_text",
                    "model": "claude-test",
                    "stop_reason": "end_turn",
                    "content": [{"type": "text", "text": text}],
                    "usage": {"input_tokens": 1, "output_tokens": 1}
                })
                .to_string(),
            )
            .create_async()
            .await
    }
}

/// A valid draft titled `title`.
#[must_use]
pub fn draft(title: &str) -> ProjectDraft {
    ProjectDraft {
        title: title.to_string(),
        description: format!("{title} description"),
        tagline: None,
        image_url: Url::parse("https://placehold.co/600x400.png").unwrap(),
        live_url: Url::parse("https://live.example.net/").unwrap(),
        github_url: Url::parse("https://github.com/adibxr/demo").unwrap(),
        tags: vec!["Rust".to_string()],
    }
}

/// Behaviour every `ProjectStore` must share. `store` must start empty.
pub async fn store_contract(store: &dyn ProjectStore) {
    assert!(store.list().await.unwrap().is_empty());

    // Create then list yields exactly one new entry.
    let first = store.create(draft("First")).await.unwrap();
    assert!(!first.id.is_empty());
    let listed = store.list().await.unwrap();
    assert_eq!(listed, vec![first.clone()]);

    // Update changes only the target.
    let second = store.create(draft("Second")).await.unwrap();
    assert_ne!(first.id, second.id);
    let mut changed = draft("Second, revised");
    changed.tags = vec!["Go".to_string(), "Rust".to_string()];
    store.update(&second.id, changed.clone()).await.unwrap();
    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&first));
    assert!(listed.contains(&changed.with_id(second.id.clone())));

    // Update of a missing id is NotFound and never creates.
    let err = store
        .update(&ProjectId::new("missing-id"), draft("Ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
    assert_eq!(store.list().await.unwrap().len(), 2);

    // Delete removes; deleting again is not an error.
    store.delete(&first.id).await.unwrap();
    store.delete(&first.id).await.unwrap();
    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed.iter().all(|p| p.id != first.id));
}
