use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifier assigned by storage when a book is first persisted.
pub type BookId = i64;

/// Widest value the `title_name` and `author_name` columns accept.
pub const MAX_FIELD_CHARS: usize = 255;

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Unique identifier for the book
    pub id: BookId,
    /// Title of the book, unique across the catalog
    #[serde(rename = "title_name")]
    #[sqlx(rename = "title_name")]
    pub title: String,
    /// Author of the book
    #[serde(rename = "author_name")]
    #[sqlx(rename = "author_name")]
    pub author: String,
    /// Publication date
    pub published_at: NaiveDate,
}

/// Request body for create and update, before validation.
///
/// Every field is optional here so that missing fields surface as
/// validation errors rather than as a generic decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPayload {
    #[serde(default, rename = "title_name", alias = "title")]
    pub title: Option<String>,
    #[serde(default, rename = "author_name", alias = "author")]
    pub author: Option<String>,
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is kept.
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Validated field values for a book that is about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub published_at: NaiveDate,
}

/// One rejected field of a [`BookPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

impl FieldError {
    fn new(field: &'static str, error: impl Into<String>) -> Self {
        Self {
            field,
            error: error.into(),
        }
    }
}

impl BookPayload {
    /// Check every field, reporting all problems at once.
    pub fn validate(self) -> Result<NewBook, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = required_text("title_name", self.title, &mut errors);
        let author = required_text("author_name", self.author, &mut errors);
        let published_at = match self.published_at {
            None => {
                errors.push(FieldError::new("published_at", "required"));
                None
            }
            Some(raw) => match parse_published_at(&raw) {
                Some(date) => Some(date),
                None => {
                    errors.push(FieldError::new(
                        "published_at",
                        "expected a YYYY-MM-DD date or an RFC 3339 timestamp",
                    ));
                    None
                }
            },
        };

        match (title, author, published_at) {
            (Some(title), Some(author), Some(published_at)) if errors.is_empty() => Ok(NewBook {
                title,
                author,
                published_at,
            }),
            _ => Err(errors),
        }
    }
}

fn required_text(
    field: &'static str,
    value: Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value {
        None => {
            errors.push(FieldError::new(field, "required"));
            None
        }
        Some(value) if value.trim().is_empty() => {
            errors.push(FieldError::new(field, "must not be empty"));
            None
        }
        Some(value) if value.chars().count() > MAX_FIELD_CHARS => {
            errors.push(FieldError::new(
                field,
                format!("must be at most {MAX_FIELD_CHARS} characters"),
            ));
            None
        }
        Some(value) => Some(value),
    }
}

fn parse_published_at(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}
