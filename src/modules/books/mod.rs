pub mod models;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use folio_kernel::{settings::DatabaseSettings, InitCtx, Module, TableSchema};
use sqlx::PgPool;

use service::BookService;
use store::{BookStore, PgBookStore};

/// Catalog of book records with unique titles
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(service: Arc<BookService>) -> Self {
        Self { service }
    }

    /// Module over an arbitrary store, e.g. [`store::MemoryBookStore`].
    pub fn with_store(store: Arc<dyn BookStore>, settings: &DatabaseSettings) -> Self {
        Self::new(Arc::new(BookService::new(store, settings.query_timeout())))
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            query_timeout_ms = ctx.settings.database.query_timeout_ms,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let json_body = |schema: serde_json::Value| {
            serde_json::json!({ "content": { "application/json": { "schema": schema } } })
        };
        let book_envelope = json_body(serde_json::json!({
            "type": "object",
            "properties": { "book": { "$ref": "#/components/schemas/Book" } }
        }));
        let book_input = json_body(serde_json::json!({ "$ref": "#/components/schemas/BookInput" }));
        let id_param = serde_json::json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }]);

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Every book in the catalog",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "books": {
                                                    "type": "array",
                                                    "items": { "$ref": "#/components/schemas/Book" }
                                                }
                                            }
                                        }
                                    }
                                }
                            },
                            "500": error("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_input,
                        "responses": {
                            "201": { "description": "Created", "content": book_envelope["content"] },
                            "400": error("Invalid input"),
                            "409": error("Title already taken"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/{id}": {
                    "parameters": id_param,
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": { "description": "The book", "content": book_envelope["content"] },
                            "404": error("No book with this id"),
                            "500": error("Internal server error")
                        }
                    },
                    "put": {
                        "summary": "Replace a book's fields",
                        "tags": ["Books"],
                        "requestBody": book_input,
                        "responses": {
                            "200": {
                                "description": "Updated",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "message": { "type": "string" },
                                                "updated_id": { "type": "integer", "format": "int64" }
                                            }
                                        }
                                    }
                                }
                            },
                            "400": error("Invalid input"),
                            "409": error("Title already taken"),
                            "500": error("Internal server error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": { "description": "Deleted" },
                            "404": error("No book with this id"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            },
                            "500": error("Storage unreachable")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title_name": { "type": "string", "description": "Unique title" },
                            "author_name": { "type": "string" },
                            "published_at": { "type": "string", "format": "date" }
                        },
                        "required": ["id", "title_name", "author_name", "published_at"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title_name": { "type": "string", "maxLength": models::MAX_FIELD_CHARS },
                            "author_name": { "type": "string", "maxLength": models::MAX_FIELD_CHARS },
                            "published_at": {
                                "type": "string",
                                "description": "YYYY-MM-DD or RFC 3339 timestamp"
                            }
                        },
                        "required": ["title_name", "author_name", "published_at"]
                    }
                }
            }
        }))
    }

    fn schema(&self) -> Vec<TableSchema> {
        vec![TableSchema {
            id: "001_books",
            ddl: store::postgres::BOOKS_TABLE_DDL,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over the shared Postgres pool
pub fn create_module(pool: PgPool, settings: &DatabaseSettings) -> Arc<dyn Module> {
    let store = PgBookStore::new(pool, settings.query_timeout());
    Arc::new(BooksModule::with_store(Arc::new(store), settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemoryBookStore;

    fn module() -> BooksModule {
        BooksModule::with_store(
            Arc::new(MemoryBookStore::default()),
            &DatabaseSettings::default(),
        )
    }

    #[test]
    fn owns_the_books_table() {
        let schema = module().schema();
        assert_eq!(schema.len(), 1);
        assert!(schema[0].ddl.contains("title_name   VARCHAR(255) NOT NULL UNIQUE"));
    }

    #[test]
    fn openapi_fragment_is_valid_for_the_merge() {
        let mut registry = folio_kernel::ModuleRegistry::new();
        registry.register(Arc::new(module()));

        let doc = folio_http::router::openapi_document(&registry, "/api/v1");
        assert!(doc["paths"]["/api/v1/books"]["post"].is_object());
        assert!(doc["paths"]["/api/v1/books/{id}"]["delete"].is_object());
        assert!(doc["paths"]["/api/v1/books/health"]["get"].is_object());
        assert!(doc["components"]["schemas"]["BookInput"].is_object());
    }
}
