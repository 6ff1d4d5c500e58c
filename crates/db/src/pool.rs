//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits.

use anyhow::Context;
use folio_kernel::settings::DatabaseSettings;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create the PostgreSQL connection pool and verify the server is reachable.
///
/// # Errors
///
/// Returns an error if the pool cannot connect or the ping fails.
pub async fn create_pool(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        url = %settings.redacted_url(),
        max_connections = settings.max_connections,
        "connecting to database"
    );

    let options = settings.connect_options()?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout())
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to {}", settings.redacted_url()))?;

    ping(&pool).await.context("database not reachable")?;

    tracing::info!("database connected");
    Ok(pool)
}

/// Round-trip a trivial query.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
