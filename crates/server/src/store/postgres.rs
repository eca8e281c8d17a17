//! Project store backed by `PostgreSQL`.
//!
//! Queries are checked at runtime (`query_as` with `FromRow`) so the crate
//! builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use url::Url;
use uuid::Uuid;

use folio_core::{Project, ProjectDraft, ProjectId};

use super::{ProjectStore, StoreError};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `folio.project` queries.
#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: ProjectId,
    title: String,
    description: String,
    tagline: Option<String>,
    image_url: String,
    live_url: String,
    github_url: String,
    tags: Vec<String>,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let parse = |column: &str, value: &str| {
            Url::parse(value).map_err(|e| {
                StoreError::DataCorruption(format!("project {} has invalid {column}: {e}", row.id))
            })
        };

        Ok(Self {
            image_url: parse("image_url", &row.image_url)?,
            live_url: parse("live_url", &row.live_url)?,
            github_url: parse("github_url", &row.github_url)?,
            id: row.id,
            title: row.title,
            description: row.description,
            tagline: row.tagline,
            tags: row.tags,
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// `folio.project` table.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProjectStore for PostgresStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r"
            SELECT id, title, description, tagline, image_url, live_url, github_url,
                   tags, created_at
            FROM folio.project
            ORDER BY created_at, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Project::try_from).collect()
    }

    async fn create(&self, draft: ProjectDraft) -> Result<Project, StoreError> {
        let id = ProjectId::new(Uuid::new_v4().to_string());
        let row = sqlx::query_as::<_, ProjectRow>(
            r"
            INSERT INTO folio.project
                (id, title, description, tagline, image_url, live_url, github_url, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, tagline, image_url, live_url, github_url,
                      tags, created_at
            ",
        )
        .bind(&id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.tagline)
        .bind(draft.image_url.as_str())
        .bind(draft.live_url.as_str())
        .bind(draft.github_url.as_str())
        .bind(&draft.tags)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update(&self, id: &ProjectId, draft: ProjectDraft) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE folio.project
            SET title = $2, description = $3, tagline = $4, image_url = $5,
                live_url = $6, github_url = $7, tags = $8, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.tagline)
        .bind(draft.image_url.as_str())
        .bind(draft.live_url.as_str())
        .bind(draft.github_url.as_str())
        .bind(&draft.tags)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM folio.project WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
