//! Record Service: the catalog's use cases over a [`BookStore`].
//!
//! Create and Update follow a two-step protocol: an existence check on the
//! title, then the write. The two steps are not atomic, so a concurrent
//! writer can slip in between them. The store's own uniqueness constraint
//! catches that case and it is reported as a conflict as well.

use std::sync::Arc;
use std::time::Duration;

use folio_db::Deadline;

use super::models::{Book, BookId, BookPayload, FieldError};
use super::store::{BookStore, StoreError};

/// Outcome classes of a catalog operation.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("invalid book payload")]
    Validation(Vec<FieldError>),

    #[error("a book titled '{title}' already exists")]
    Conflict { title: String },

    #[error("book {id} not found")]
    NotFound { id: BookId },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Maps a write failure, treating a constraint hit as a lost race.
fn write_failure(err: StoreError) -> BookError {
    match err {
        StoreError::Duplicate { title } => BookError::Conflict { title },
        other => BookError::Storage(other),
    }
}

pub struct BookService {
    store: Arc<dyn BookStore>,
    query_timeout: Duration,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>, query_timeout: Duration) -> Self {
        Self {
            store,
            query_timeout,
        }
    }

    /// Fresh deadline for one inbound request.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.query_timeout)
    }

    pub async fn create(&self, deadline: &Deadline, payload: BookPayload) -> Result<Book, BookError> {
        let book = payload.validate().map_err(BookError::Validation)?;

        if self.store.title_exists(deadline, &book.title, None).await? {
            return Err(BookError::Conflict { title: book.title });
        }

        let id = self
            .store
            .insert(deadline, &book)
            .await
            .map_err(write_failure)?;

        tracing::info!(module = "books", book_id = id, title = %book.title, "book created");

        Ok(Book {
            id,
            title: book.title,
            author: book.author,
            published_at: book.published_at,
        })
    }

    pub async fn get_one(&self, deadline: &Deadline, id: BookId) -> Result<Book, BookError> {
        self.store
            .find_by_id(deadline, id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { id } => BookError::NotFound { id },
                other => BookError::Storage(other),
            })
    }

    pub async fn get_all(&self, deadline: &Deadline) -> Result<Vec<Book>, BookError> {
        Ok(self.store.find_all(deadline).await?)
    }

    /// Replace a book's fields; returns the id that was updated.
    ///
    /// An id with no row comes back as a storage failure, not `NotFound`.
    pub async fn update(
        &self,
        deadline: &Deadline,
        id: BookId,
        payload: BookPayload,
    ) -> Result<BookId, BookError> {
        let book = payload.validate().map_err(BookError::Validation)?;

        if self
            .store
            .title_exists(deadline, &book.title, Some(id))
            .await?
        {
            return Err(BookError::Conflict { title: book.title });
        }

        let updated = self
            .store
            .update(deadline, id, &book)
            .await
            .map_err(write_failure)?;

        tracing::info!(module = "books", book_id = updated, "book updated");
        Ok(updated)
    }

    /// Remove a book; a missing id is `NotFound` even when a concurrent
    /// delete removes it between the existence check and the write.
    pub async fn delete(&self, deadline: &Deadline, id: BookId) -> Result<(), BookError> {
        if !self.store.book_exists(deadline, id).await? {
            return Err(BookError::NotFound { id });
        }

        self.store
            .delete(deadline, id)
            .await
            .map_err(|err| match err {
                StoreError::NoRowsAffected { id } => BookError::NotFound { id },
                other => BookError::Storage(other),
            })?;

        tracing::info!(module = "books", book_id = id, "book deleted");
        Ok(())
    }

    pub async fn health(&self, deadline: &Deadline) -> Result<(), BookError> {
        Ok(self.store.ping(deadline).await?)
    }
}
