//! HTTP routes for the books module.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use folio_http::AppError;
use serde_json::{json, Value};

use super::models::{BookId, BookPayload};
use super::service::{BookError, BookService};

type SharedService = Arc<BookService>;

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Validation(fields) => AppError::validation(
                fields
                    .iter()
                    .map(|field| json!({ "field": field.field, "error": field.error }))
                    .collect(),
                "Invalid input!",
            ),
            BookError::Conflict { title } => AppError::conflict(
                vec![json!({ "field": "title_name", "value": title })],
                "Book with the same title already exists!",
            ),
            BookError::NotFound { id } => AppError::not_found(format!("Book {id} not found!")),
            BookError::Storage(err) => AppError::Internal(
                anyhow::Error::new(err).context("book storage operation failed"),
            ),
        }
    }
}

/// Registers the books routes; the caller nests them under the module path.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/", post(create_book).get(list_books))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(service)
}

async fn create_book(
    State(service): State<SharedService>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(payload) = payload?;
    let deadline = service.deadline();

    let book = service.create(&deadline, payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "book": book }))))
}

async fn get_book(
    State(service): State<SharedService>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    let deadline = service.deadline();

    let book = service.get_one(&deadline, id).await?;
    Ok(Json(json!({ "book": book })))
}

async fn list_books(State(service): State<SharedService>) -> Result<Json<Value>, AppError> {
    let deadline = service.deadline();

    let books = service.get_all(&deadline).await?;
    Ok(Json(json!({ "books": books })))
}

async fn update_book(
    State(service): State<SharedService>,
    id: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let deadline = service.deadline();

    let updated_id = service.update(&deadline, id, payload).await?;
    Ok(Json(json!({
        "message": "Book updated successfully",
        "updated_id": updated_id
    })))
}

async fn delete_book(
    State(service): State<SharedService>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    let deadline = service.deadline();

    service.delete(&deadline, id).await?;
    Ok(Json(json!({ "message": "Book deleted successfully" })))
}

async fn health_check(State(service): State<SharedService>) -> Result<&'static str, AppError> {
    let deadline = service.deadline();
    service.health(&deadline).await?;
    Ok("books module is healthy")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::store::testing::UnavailableStore;
    use crate::modules::books::store::MemoryBookStore;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let service = BookService::new(Arc::new(MemoryBookStore::default()), Duration::from_secs(2));
        router(Arc::new(service))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn dune() -> Value {
        json!({
            "title_name": "Dune",
            "author_name": "Herbert",
            "published_at": "1965-08-01"
        })
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let app = app();

        let (status, body) = send(&app, Method::POST, "/", Some(dune())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["book"]["id"].as_i64().unwrap();

        let (status, body) = send(&app, Method::GET, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["book"]["title_name"], "Dune");
        assert_eq!(body["book"]["author_name"], "Herbert");
        assert_eq!(body["book"]["published_at"], "1965-08-01");
    }

    #[tokio::test]
    async fn duplicate_create_is_409() {
        let app = app();
        send(&app, Method::POST, "/", Some(dune())).await;

        let (status, body) = send(&app, Method::POST, "/", Some(dune())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "conflict");
    }

    #[tokio::test]
    async fn invalid_input_is_400() {
        let app = app();

        let (status, body) = send(&app, Method::POST, "/", Some(json!({ "title_name": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["details"].as_array().unwrap().len(), 3);

        let (status, body) = send(&app, Method::POST, "/", Some(json!("not an object"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn empty_catalog_lists_an_empty_array() {
        let (status, body) = send(&app(), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "books": [] }));
    }

    #[tokio::test]
    async fn missing_book_is_404() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/12", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, "/12", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_400() {
        let (status, body) = send(&app(), Method::GET, "/twelve", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn update_reports_updated_id() {
        let app = app();
        let (_, body) = send(&app, Method::POST, "/", Some(dune())).await;
        let id = body["book"]["id"].as_i64().unwrap();

        let mut changed = dune();
        changed["author_name"] = json!("Frank Herbert");
        let (status, body) = send(&app, Method::PUT, &format!("/{id}"), Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated_id"], id);
        assert_eq!(body["message"], "Book updated successfully");
    }

    #[tokio::test]
    async fn update_of_missing_book_is_500() {
        let (status, body) = send(&app(), Method::PUT, "/5", Some(dune())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "internal_error");
    }

    #[tokio::test]
    async fn update_to_taken_title_is_409() {
        let app = app();
        send(&app, Method::POST, "/", Some(dune())).await;
        let (_, body) = send(
            &app,
            Method::POST,
            "/",
            Some(json!({
                "title_name": "Emma",
                "author_name": "Austen",
                "published_at": "1815-12-23"
            })),
        )
        .await;
        let emma = body["book"]["id"].as_i64().unwrap();

        let (status, _) = send(&app, Method::PUT, &format!("/{emma}"), Some(dune())).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn delete_confirms() {
        let app = app();
        let (_, body) = send(&app, Method::POST, "/", Some(dune())).await;
        let id = body["book"]["id"].as_i64().unwrap();

        let (status, body) = send(&app, Method::DELETE, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Book deleted successfully");

        let (status, _) = send(&app, Method::GET, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_route_is_not_shadowed_by_id() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("books module is healthy"));
    }

    #[tokio::test]
    async fn storage_outage_is_500_for_every_operation() {
        let service = BookService::new(Arc::new(UnavailableStore::timing_out()), Duration::from_secs(2));
        let app = router(Arc::new(service));

        let calls = [
            (Method::POST, "/", Some(dune())),
            (Method::GET, "/", None),
            (Method::GET, "/1", None),
            (Method::PUT, "/1", Some(dune())),
            (Method::DELETE, "/1", None),
            (Method::GET, "/health", None),
        ];
        for (method, uri, body) in calls {
            let (status, response) = send(&app, method.clone(), uri, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
            assert_eq!(response["error"]["code"], "internal_error", "{method} {uri}");
        }
    }
}
