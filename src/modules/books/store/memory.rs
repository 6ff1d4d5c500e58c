//! In-process [`BookStore`] with the same contract as the Postgres one.
//!
//! Title uniqueness is enforced inside the write itself, mirroring the
//! table's UNIQUE constraint, and ids come from a counter that only grows.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use folio_db::Deadline;

use super::{bounded, BookStore, StoreError};
use crate::modules::books::models::{Book, BookId, NewBook};

#[derive(Default)]
struct Shelf {
    last_id: BookId,
    books: BTreeMap<BookId, Book>,
}

impl Shelf {
    fn title_taken(&self, title: &str, exclude: Option<BookId>) -> bool {
        self.books
            .values()
            .any(|book| book.title == title && Some(book.id) != exclude)
    }
}

pub struct MemoryBookStore {
    shelf: Mutex<Shelf>,
    query_timeout: Duration,
}

impl MemoryBookStore {
    pub fn new(query_timeout: Duration) -> Self {
        Self {
            shelf: Mutex::new(Shelf::default()),
            query_timeout,
        }
    }

    fn shelf(&self) -> MutexGuard<'_, Shelf> {
        self.shelf.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryBookStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn title_exists(
        &self,
        deadline: &Deadline,
        title: &str,
        exclude: Option<BookId>,
    ) -> Result<bool, StoreError> {
        bounded(deadline, self.query_timeout, "title_exists", async {
            Ok(self.shelf().title_taken(title, exclude))
        })
        .await
    }

    async fn insert(&self, deadline: &Deadline, book: &NewBook) -> Result<BookId, StoreError> {
        bounded(deadline, self.query_timeout, "insert", async {
            let mut shelf = self.shelf();
            if shelf.title_taken(&book.title, None) {
                return Err(StoreError::Duplicate {
                    title: book.title.clone(),
                });
            }

            shelf.last_id += 1;
            let id = shelf.last_id;
            shelf.books.insert(
                id,
                Book {
                    id,
                    title: book.title.clone(),
                    author: book.author.clone(),
                    published_at: book.published_at,
                },
            );
            Ok(id)
        })
        .await
    }

    async fn find_by_id(&self, deadline: &Deadline, id: BookId) -> Result<Book, StoreError> {
        bounded(deadline, self.query_timeout, "find_by_id", async {
            self.shelf()
                .books
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound { id })
        })
        .await
    }

    async fn find_all(&self, deadline: &Deadline) -> Result<Vec<Book>, StoreError> {
        bounded(deadline, self.query_timeout, "find_all", async {
            Ok(self.shelf().books.values().cloned().collect())
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
            let mut shelf = self.shelf();
            if !shelf.books.contains_key(&id) {
                return Err(StoreError::NoRowsAffected { id });
            }
            if shelf.title_taken(&book.title, Some(id)) {
                return Err(StoreError::Duplicate {
                    title: book.title.clone(),
                });
            }

            if let Some(stored) = shelf.books.get_mut(&id) {
                stored.title = book.title.clone();
                stored.author = book.author.clone();
                stored.published_at = book.published_at;
            }
            Ok(id)
        })
        .await
    }

    async fn delete(&self, deadline: &Deadline, id: BookId) -> Result<(), StoreError> {
        bounded(deadline, self.query_timeout, "delete", async {
            match self.shelf().books.remove(&id) {
                Some(_) => Ok(()),
                None => Err(StoreError::NoRowsAffected { id }),
            }
        })
        .await
    }

    async fn book_exists(&self, deadline: &Deadline, id: BookId) -> Result<bool, StoreError> {
        bounded(deadline, self.query_timeout, "book_exists", async {
            Ok(self.shelf().books.contains_key(&id))
        })
        .await
    }

    async fn ping(&self, deadline: &Deadline) -> Result<(), StoreError> {
        bounded(deadline, self.query_timeout, "ping", async { Ok(()) }).await
    }
}
