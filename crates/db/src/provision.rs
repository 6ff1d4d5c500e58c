//! Startup table provisioning.

use anyhow::Context;
use folio_kernel::TableSchema;
use sqlx::PgPool;

/// Execute module table schemas in the given order.
///
/// Each statement is idempotent DDL, so this runs on every startup.
pub async fn provision(pool: &PgPool, schemas: &[(String, TableSchema)]) -> anyhow::Result<()> {
    for (module, schema) in schemas {
        tracing::info!(module = %module, schema = schema.id, "provisioning table");

        sqlx::raw_sql(schema.ddl)
            .execute(pool)
            .await
            .with_context(|| format!("failed to provision {module}/{}", schema.id))?;
    }

    tracing::info!(count = schemas.len(), "tables checked/created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn provisioning_twice_is_harmless() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("pool creation failed");
        let schemas = vec![(
            "test".to_string(),
            TableSchema {
                id: "001_probe",
                ddl: "CREATE TABLE IF NOT EXISTS folio_probe (id BIGSERIAL PRIMARY KEY);",
            },
        )];

        provision(&pool, &schemas).await.expect("first run");
        provision(&pool, &schemas).await.expect("second run");
    }
}
