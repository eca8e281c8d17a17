//! Project persistence.
//!
//! One [`ProjectStore`] trait, three backends:
//!
//! - [`MemoryStore`] - process-local list for development and tests
//! - [`PostgresStore`] - `folio.project` table via sqlx
//! - [`FirebaseStore`] - Firebase Realtime Database REST API
//!
//! The backend is chosen at startup from `FOLIO_STORE`. Nothing outside this
//! module knows which one is running; authorization lives one layer up in
//! [`crate::services::ProjectService`].
//!
//! # Migrations
//!
//! Postgres migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p folio-cli -- migrate
//! ```

pub mod firebase;
pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use folio_core::{Project, ProjectDraft, ProjectId};

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::config::StoreConfig;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Transport error talking to a hosted store.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The hosted store answered with an error.
    #[error("store backend error: {0}")]
    Backend(String),

    /// Requested project does not exist.
    #[error("not found")]
    NotFound,

    /// Stored data could not be turned back into a project.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// CRUD over the project collection.
///
/// Implementations must be cheap to share across requests.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// All projects, in the backend's natural order. Empty store yields `[]`.
    async fn list(&self) -> Result<Vec<Project>, StoreError>;

    /// Persist a new project; the store assigns its id.
    async fn create(&self, draft: ProjectDraft) -> Result<Project, StoreError>;

    /// Replace every field of an existing project.
    ///
    /// Returns `StoreError::NotFound` if `id` does not exist. Never upserts.
    async fn update(&self, id: &ProjectId, draft: ProjectDraft) -> Result<(), StoreError>;

    /// Remove a project. Deleting a missing id succeeds.
    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError>;
}

/// A connected store plus the Postgres pool, when there is one.
///
/// The pool is shared with the session layer so sessions survive restarts
/// whenever projects do.
pub struct ConnectedStore {
    pub store: Arc<dyn ProjectStore>,
    pub pool: Option<PgPool>,
}

/// Build the store selected by configuration.
///
/// # Errors
///
/// Returns `StoreError` if the database is unreachable or the HTTP client
/// cannot be built.
pub async fn connect(config: &StoreConfig) -> Result<ConnectedStore, StoreError> {
    match config {
        StoreConfig::Memory => Ok(ConnectedStore {
            store: Arc::new(MemoryStore::new()),
            pool: None,
        }),
        StoreConfig::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            Ok(ConnectedStore {
                store: Arc::new(PostgresStore::new(pool.clone())),
                pool: Some(pool),
            })
        }
        StoreConfig::Firebase {
            database_url,
            auth_token,
        } => Ok(ConnectedStore {
            store: Arc::new(FirebaseStore::new(database_url.clone(), auth_token.clone())?),
            pool: None,
        }),
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
