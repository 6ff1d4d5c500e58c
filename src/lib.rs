//! folio application library
//!
//! Wires the project modules into the kernel lifecycle and the HTTP facade.

pub mod modules;

use anyhow::Context;
use folio_kernel::{InitCtx, ModuleRegistry, Settings};
use sqlx::PgPool;

/// Registry holding every project module, bound to `pool`
pub fn build_registry(pool: &PgPool, settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, pool, settings);
    registry
}

/// Create the tables every registered module declares
pub async fn provision(pool: &PgPool, registry: &ModuleRegistry) -> anyhow::Result<()> {
    folio_db::provision(pool, &registry.collect_schemas()).await
}

/// Run the service until a shutdown signal arrives
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.redacted_url(),
        "folio bootstrap starting"
    );

    let pool = folio_db::create_pool(&settings.database)
        .await
        .context("failed to create database pool")?;

    let registry = build_registry(&pool, &settings);
    provision(&pool, &registry)
        .await
        .context("failed to provision tables")?;

    let ctx = InitCtx {
        settings: &settings,
        db: &pool,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("folio bootstrap complete");

    let served = folio_http::start_server(&registry, &settings, folio_http::shutdown_signal()).await;

    let stopped = registry.stop_modules().await;
    pool.close().await;
    tracing::info!("database pool closed");

    served?;
    stopped
}
