//! `PostgresStore` against a real database.
//!
//! ```bash
//! FOLIO_DATABASE_URL=postgres://localhost/folio_test \
//!     cargo test -p folio-integration-tests --test postgres_store -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use folio_integration_tests::store_contract;
use folio_server::store::PostgresStore;
use sqlx::PgPool;

#[tokio::test]
#[ignore = "Requires FOLIO_DATABASE_URL"]
async fn test_postgres_store_contract() {
    let url = std::env::var("FOLIO_DATABASE_URL").unwrap();
    let pool = PgPool::connect(&url).await.unwrap();
    sqlx::migrate!("../server/migrations").run(&pool).await.unwrap();
    sqlx::query("DELETE FROM folio.project")
        .execute(&pool)
        .await
        .unwrap();

    store_contract(&PostgresStore::new(pool)).await;
}
