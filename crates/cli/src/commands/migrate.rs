//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! folio-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `FOLIO_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/server/migrations/`, embedded at compile time.

use secrecy::ExposeSecret;
use sqlx::PgPool;

use folio_server::config::{ConfigError, database_url_from_env};

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the server migrations against the configured database.
///
/// # Errors
///
/// Returns an error if the URL is missing, the database is unreachable, or a
/// migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
