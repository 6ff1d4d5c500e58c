pub mod books;

use folio_kernel::{ModuleRegistry, Settings};
use sqlx::PgPool;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, pool: &PgPool, settings: &Settings) {
    registry.register(books::create_module(pool.clone(), &settings.database));
}
