use async_trait::async_trait;
use axum::Router;
use sqlx::PgPool;

/// Shared resources handed to every module during startup
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
    pub db: &'a PgPool,
}

/// Idempotent DDL a module needs before it can serve requests.
///
/// Statements must be safe to run on every startup (`IF NOT EXISTS`);
/// nothing records which ones have been applied.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub id: &'static str,
    pub ddl: &'static str,
}

/// A self-contained slice of the service: its routes, docs and tables.
#[async_trait]
pub trait Module: Sync + Send {
    /// Also the path segment the routes are nested under
    fn name(&self) -> &'static str;

    /// Runs once tables exist, before any module is started
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Nested under `{api_prefix}/{name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with `paths` relative to the module root and
    /// `components.schemas`; merged into the served document.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Tables this module owns, in execution order
    fn schema(&self) -> Vec<TableSchema> {
        vec![]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called in reverse registration order on shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
