//! Postgres-backed [`BookStore`].

use std::time::Duration;

use async_trait::async_trait;
use folio_db::Deadline;
use sqlx::PgPool;

use super::{bounded, BookStore, StoreError};
use crate::modules::books::models::{Book, BookId, NewBook};

/// Table owned by the books module.
///
/// The UNIQUE constraint on `title_name` is what actually guarantees distinct
/// titles; the service-level existence check only narrows the race window.
pub const BOOKS_TABLE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id           BIGSERIAL PRIMARY KEY,
        title_name   VARCHAR(255) NOT NULL UNIQUE,
        author_name  VARCHAR(255) NOT NULL,
        published_at DATE NOT NULL
    );
"#;

/// [`BookStore`] over the shared connection pool.
#[derive(Clone)]
pub struct PgBookStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgBookStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

fn write_error(err: sqlx::Error, title: &str) -> StoreError {
    if folio_db::is_unique_violation(&err) {
        StoreError::Duplicate {
            title: title.to_owned(),
        }
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn title_exists(
        &self,
        deadline: &Deadline,
        title: &str,
        exclude: Option<BookId>,
    ) -> Result<bool, StoreError> {
        bounded(deadline, self.query_timeout, "title_exists", async {
            let exists: bool = sqlx::query_scalar(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM books
                    WHERE title_name = $1 AND ($2::BIGINT IS NULL OR id <> $2)
                )
                "#,
            )
            .bind(title)
            .bind(exclude)
            .fetch_one(&self.pool)
            .await?;
            Ok(exists)
        })
        .await
    }

    async fn insert(&self, deadline: &Deadline, book: &NewBook) -> Result<BookId, StoreError> {
        bounded(deadline, self.query_timeout, "insert", async {
            let id: BookId = sqlx::query_scalar(
                r#"
                INSERT INTO books (title_name, author_name, published_at)
                VALUES ($1, $2, $3)
                RETURNING id
                "#,
            )
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.published_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| write_error(err, &book.title))?;

            tracing::debug!(module = "books", book_id = id, "book inserted");
            Ok(id)
        })
        .await
    }

    async fn find_by_id(&self, deadline: &Deadline, id: BookId) -> Result<Book, StoreError> {
        bounded(deadline, self.query_timeout, "find_by_id", async {
            sqlx::query_as::<_, Book>(
                r#"
                SELECT id, title_name, author_name, published_at
                FROM books
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { id })
        })
        .await
    }

    async fn find_all(&self, deadline: &Deadline) -> Result<Vec<Book>, StoreError> {
        bounded(deadline, self.query_timeout, "find_all", async {
            // fetch_all fails on the first undecodable row; no partial lists.
            let books = sqlx::query_as::<_, Book>(
                r#"
                SELECT id, title_name, author_name, published_at
                FROM books
                ORDER BY id
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(books)
        })
        .await
    }

    async fn update(
        &self,
        deadline: &Deadline,
        id: BookId,
        book: &NewBook,
    ) -> Result<BookId, StoreError> {
        bounded(deadline, self.query_timeout, "update", async {
            let updated: Option<BookId> = sqlx::query_scalar(
                r#"
                UPDATE books
                SET title_name = $1, author_name = $2, published_at = $3
                WHERE id = $4
                RETURNING id
                "#,
            )
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.published_at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| write_error(err, &book.title))?;

            updated.ok_or(StoreError::NoRowsAffected { id })
        })
        .await
    }

    async fn delete(&self, deadline: &Deadline, id: BookId) -> Result<(), StoreError> {
        bounded(deadline, self.query_timeout, "delete", async {
            let result = sqlx::query("DELETE FROM books WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NoRowsAffected { id });
            }
            Ok(())
        })
        .await
    }

    async fn book_exists(&self, deadline: &Deadline, id: BookId) -> Result<bool, StoreError> {
        bounded(deadline, self.query_timeout, "book_exists", async {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(exists)
        })
        .await
    }

    async fn ping(&self, deadline: &Deadline) -> Result<(), StoreError> {
        bounded(deadline, self.query_timeout, "ping", async {
            folio_db::ping(&self.pool).await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // Integration tests - run with DATABASE_URL set
    // cargo test -p folio-app -- --ignored

    async fn store() -> PgBookStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("pool creation failed");
        sqlx::raw_sql(BOOKS_TABLE_DDL)
            .execute(&pool)
            .await
            .expect("provisioning failed");
        PgBookStore::new(pool, Duration::from_secs(2))
    }

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(2))
    }

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Herbert".to_string(),
            published_at: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
        }
    }

    fn unique_title(prefix: &str) -> String {
        format!("{prefix}-{}", std::process::id())
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unique_constraint_backs_the_precheck() {
        let store = store().await;
        let title = unique_title("constraint");

        let id = store.insert(&deadline(), &new_book(&title)).await.unwrap();
        let err = store.insert(&deadline(), &new_book(&title)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));

        store.delete(&deadline(), id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn round_trip_and_exclusion() {
        let store = store().await;
        let title = unique_title("round-trip");

        let id = store.insert(&deadline(), &new_book(&title)).await.unwrap();
        let found = store.find_by_id(&deadline(), id).await.unwrap();
        assert_eq!(found.title, title);
        assert_eq!(found.published_at, NaiveDate::from_ymd_opt(1965, 8, 1).unwrap());

        assert!(store.title_exists(&deadline(), &title, None).await.unwrap());
        assert!(!store.title_exists(&deadline(), &title, Some(id)).await.unwrap());

        store.delete(&deadline(), id).await.unwrap();
        assert!(matches!(
            store.find_by_id(&deadline(), id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&deadline(), id).await,
            Err(StoreError::NoRowsAffected { .. })
        ));
    }
}
