//! Storage Gateway for book records.
//!
//! Each call is a single round trip bounded by the caller's [`Deadline`],
//! further capped at the configured query timeout. Callers never see a
//! partial result: a call either completes or fails as a whole.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use folio_db::Deadline;

use super::models::{Book, BookId, NewBook};

pub mod memory;
pub mod postgres;

pub use memory::MemoryBookStore;
pub use postgres::PgBookStore;

/// Failures surfaced by a [`BookStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("book {id} not found")]
    NotFound { id: BookId },

    /// An update or delete matched no row.
    #[error("no book with id {id} was affected")]
    NoRowsAffected { id: BookId },

    /// The storage-level unique constraint on the title rejected the write.
    #[error("title '{title}' is already taken")]
    Duplicate { title: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether a caller could reasonably retry with backoff.
    ///
    /// Nothing in this crate retries; this is for the layers above.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Timeout { .. } => true,
            StoreError::Database(err) => folio_db::is_connection_error(err),
            _ => false,
        }
    }
}

/// Persistence operations for the catalog.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Whether any book other than `exclude` carries exactly this title.
    async fn title_exists(
        &self,
        deadline: &Deadline,
        title: &str,
        exclude: Option<BookId>,
    ) -> Result<bool, StoreError>;

    /// Persist a new book and return its assigned id.
    async fn insert(&self, deadline: &Deadline, book: &NewBook) -> Result<BookId, StoreError>;

    async fn find_by_id(&self, deadline: &Deadline, id: BookId) -> Result<Book, StoreError>;

    /// Every stored book; a failure part way through fails the whole call.
    async fn find_all(&self, deadline: &Deadline) -> Result<Vec<Book>, StoreError>;

    /// Overwrite every field but the id.
    async fn update(
        &self,
        deadline: &Deadline,
        id: BookId,
        book: &NewBook,
    ) -> Result<BookId, StoreError>;

    async fn delete(&self, deadline: &Deadline, id: BookId) -> Result<(), StoreError>;

    async fn book_exists(&self, deadline: &Deadline, id: BookId) -> Result<bool, StoreError>;

    async fn ping(&self, deadline: &Deadline) -> Result<(), StoreError>;
}

/// Run one storage call under `deadline`, capped at `limit`.
pub(crate) async fn bounded<T, F>(
    deadline: &Deadline,
    limit: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match deadline.capped(limit).run(call).await {
        Ok(result) => result,
        Err(exceeded) => {
            tracing::warn!(
                module = "books",
                operation,
                budget = ?exceeded.budget,
                "storage call timed out"
            );
            Err(StoreError::Timeout {
                operation,
                after: exceeded.budget,
            })
        }
    }
}
