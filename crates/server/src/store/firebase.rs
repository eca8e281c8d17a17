//! Project store backed by the Firebase Realtime Database REST API.
//!
//! Projects live under `/projects`, keyed by the push id Firebase assigns on
//! `POST`. Push ids sort chronologically, so key order is insertion order.
//!
//! # Endpoints
//!
//! - `GET    /projects.json` - key → record map, or `null` when empty
//! - `POST   /projects.json` - returns `{"name": "<key>"}`
//! - `GET    /projects/{key}.json?shallow=true` - existence check before update
//! - `PUT    /projects/{key}.json` - full replace
//! - `DELETE /projects/{key}.json` - remove (succeeds for missing keys)

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use folio_core::{Project, ProjectDraft, ProjectId};

use super::{ProjectStore, StoreError};

const COLLECTION: &str = "projects";

/// Body returned by a Firebase push.
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Realtime Database client for the project collection.
#[derive(Clone)]
pub struct FirebaseStore {
    client: Client,
    base_url: Url,
    auth_token: Option<SecretString>,
}

impl std::fmt::Debug for FirebaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseStore")
            .field("base_url", &self.base_url.as_str())
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl FirebaseStore {
    /// Create a client for the database at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: Url, auth_token: Option<SecretString>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    /// Build `{base}/projects[/{key}].json` with the auth query parameter.
    fn url(&self, key: Option<&ProjectId>) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| StoreError::Backend("database URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            match key {
                None => {
                    segments.push(&format!("{COLLECTION}.json"));
                }
                Some(key) => {
                    segments.push(COLLECTION).push(&format!("{key}.json"));
                }
            }
        }
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut()
                .append_pair("auth", token.expose_secret());
        }
        Ok(url)
    }

    async fn exists(&self, id: &ProjectId) -> Result<bool, StoreError> {
        let mut url = self.url(Some(id))?;
        url.query_pairs_mut().append_pair("shallow", "true");

        let response = self.client.get(url).send().await.map_err(redact)?;
        let value: serde_json::Value = check(response).await?.json().await.map_err(redact)?;
        Ok(!value.is_null())
    }
}

/// Strip the URL (and with it the auth token) from transport errors.
fn redact(err: reqwest::Error) -> StoreError {
    StoreError::Http(err.without_url())
}

/// Turn a non-success status into `StoreError::Backend`.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Backend(format!("firebase returned {status}: {body}")))
}

fn decode(key: String, value: serde_json::Value) -> Result<Project, StoreError> {
    let draft: ProjectDraft = serde_json::from_value(value)
        .map_err(|e| StoreError::DataCorruption(format!("project {key}: {e}")))?;
    Ok(draft.with_id(ProjectId::new(key)))
}

#[async_trait]
impl ProjectStore for FirebaseStore {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let response = self.client.get(self.url(None)?).send().await.map_err(redact)?;
        let records: Option<BTreeMap<String, serde_json::Value>> =
            check(response).await?.json().await.map_err(redact)?;

        records
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| decode(key, value))
            .collect()
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create(&self, draft: ProjectDraft) -> Result<Project, StoreError> {
        let response = self
            .client
            .post(self.url(None)?)
            .json(&draft)
            .send()
            .await
            .map_err(redact)?;
        let pushed: PushResponse = check(response).await?.json().await.map_err(redact)?;

        Ok(draft.with_id(ProjectId::new(pushed.name)))
    }

    #[instrument(skip(self, draft), fields(project_id = %id))]
    async fn update(&self, id: &ProjectId, draft: ProjectDraft) -> Result<(), StoreError> {
        // PUT would silently create the record.
        if !self.exists(id).await? {
            return Err(StoreError::NotFound);
        }

        let response = self
            .client
            .put(self.url(Some(id))?)
            .json(&draft)
            .send()
            .await
            .map_err(redact)?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(project_id = %id))]
    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.url(Some(id))?)
            .send()
            .await
            .map_err(redact)?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn record(title: &str) -> serde_json::Value {
        json!({
            "title": title,
            "description": "desc",
            "imageUrl": "https://placehold.co/600x400.png",
            "liveUrl": "https://live.example.net/",
            "githubUrl": "https://github.com/adibxr/demo",
            "tags": ["Next.js", "Firebase"]
        })
    }

    fn draft() -> ProjectDraft {
        serde_json::from_value(record("DevCard")).unwrap()
    }

    fn store(server: &mockito::Server, token: Option<&str>) -> FirebaseStore {
        FirebaseStore::new(
            Url::parse(&server.url()).unwrap(),
            token.map(|t| SecretString::from(t.to_string())),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_null_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/projects.json")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let projects = store(&server, None).list().await.unwrap();
        assert!(projects.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_maps_keys_to_ids_in_key_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects.json")
            .match_query(Matcher::UrlEncoded("auth".into(), "db-token".into()))
            .with_status(200)
            .with_body(json!({ "-Nb": record("Second"), "-Na": record("First") }).to_string())
            .create_async()
            .await;

        let projects = store(&server, Some("db-token")).list().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id.as_str(), "-Na");
        assert_eq!(projects[0].title, "First");
        assert_eq!(projects[1].id.as_str(), "-Nb");
        assert_eq!(projects[1].tags, vec!["Next.js", "Firebase"]);
    }

    #[tokio::test]
    async fn test_list_corrupt_record() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects.json")
            .with_status(200)
            .with_body(json!({ "-Na": { "title": "no urls" } }).to_string())
            .create_async()
            .await;

        let err = store(&server, None).list().await.unwrap_err();
        assert!(matches!(err, StoreError::DataCorruption(_)));
    }

    #[tokio::test]
    async fn test_create_uses_push_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/projects.json")
            .match_body(Matcher::PartialJson(json!({ "title": "DevCard" })))
            .with_status(200)
            .with_body(r#"{"name":"-NxNew"}"#)
            .create_async()
            .await;

        let project = store(&server, None).create(draft()).await.unwrap();
        assert_eq!(project.id.as_str(), "-NxNew");
        assert_eq!(project.title, "DevCard");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_missing_does_not_put() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/-Nmissing.json")
            .match_query(Matcher::UrlEncoded("shallow".into(), "true".into()))
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/projects/-Nmissing.json")
            .expect(0)
            .create_async()
            .await;

        let err = store(&server, None)
            .update(&ProjectId::new("-Nmissing"), draft())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_existing_puts_full_record() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/-Na.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"title":true,"description":true}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/projects/-Na.json")
            .match_body(Matcher::Json(record("DevCard")))
            .with_status(200)
            .with_body(record("DevCard").to_string())
            .create_async()
            .await;

        store(&server, None)
            .update(&ProjectId::new("-Na"), draft())
            .await
            .unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_surfaces_backend_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/projects/-Na.json")
            .with_status(401)
            .with_body(r#"{"error":"Permission denied"}"#)
            .create_async()
            .await;

        let err = store(&server, None)
            .delete(&ProjectId::new("-Na"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(ref msg) if msg.contains("401")));
    }
}
