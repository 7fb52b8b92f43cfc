//! Entity types for the book store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a collection-scoped identifier, e.g. `book-9f8c2d…`.
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// An author, created on first use and deduplicated by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub author_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Author {
    /// Placeholder shown when a book references a missing author.
    pub fn unknown() -> Self {
        Self {
            author_id: String::new(),
            first_name: "Unknown".to_string(),
            last_name: "Author".to_string(),
        }
    }
}

/// A book category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: String,
    pub name: String,
}

impl Category {
    /// Placeholder shown when a book references a missing category.
    pub fn uncategorized() -> Self {
        Self {
            category_id: String::new(),
            name: "Uncategorized".to_string(),
        }
    }
}

/// A user-defined collection of books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub collection_id: String,
    pub name: String,
}

/// The three reading states a book can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Not started")]
    NotStarted,
    Reading,
    Finished,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotStarted => "Not started",
            Status::Reading => "Reading",
            Status::Finished => "Finished",
        }
    }

    /// Identifier of the seeded status record for this state.
    pub fn id(&self) -> &'static str {
        match self {
            Status::NotStarted => "not-started",
            Status::Reading => "reading",
            Status::Finished => "finished",
        }
    }

    /// Parse a status label or identifier in any casing.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "not started" | "not-started" => Some(Status::NotStarted),
            "reading" => Some(Status::Reading),
            "finished" => Some(Status::Finished),
            _ => None,
        }
    }
}

/// A reading status record as stored in its slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingStatus {
    pub reading_status_id: String,
    pub status: Status,
}

impl ReadingStatus {
    /// Placeholder shown when a book references a missing status.
    pub fn not_started() -> Self {
        Self {
            reading_status_id: String::new(),
            status: Status::NotStarted,
        }
    }
}

/// A rating with an optional comment. At most one per book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub book_id: String,
    /// 0 to 5 in half-star steps. Callers validate; the store does not.
    pub rating: f32,
    pub comment: String,
}

/// A book record. All relations are held as plain id strings; a dangling
/// id is not an error and resolves to a placeholder on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: String,
    pub title: String,
    pub author_id: String,
    pub category_id: String,
    pub reading_status_id: String,
    pub publisher: String,
    pub isbn: String,
    pub pages: u32,
    pub bookcover: String,
    /// Unordered, duplicate-free. Absent in older payloads.
    #[serde(default)]
    pub collection_ids: Vec<String>,
}

/// Payload for creating a book before it has an identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub category_id: String,
    pub reading_status_id: String,
    pub publisher: String,
    pub isbn: String,
    pub pages: u32,
    pub bookcover: String,
    pub collection_ids: Vec<String>,
}

/// A book joined with its related records. Derived on every read,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct BookWithDetails {
    pub book: Book,
    pub author: Author,
    pub category: Category,
    pub reading_status: ReadingStatus,
    pub review: Option<Review>,
    pub collections: Vec<Collection>,
}

impl BookWithDetails {
    /// Author display name, `first last` with a lone part standing alone.
    pub fn author_name(&self) -> String {
        format!("{} {}", self.author.first_name, self.author.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_applies_prefix_and_is_unique() {
        let a = new_id("book");
        let b = new_id("book");
        assert!(a.starts_with("book-"));
        assert!(a.len() > "book-".len());
        assert_ne!(a, b);
    }

    #[test]
    fn test_status_from_str_ignores_case() {
        assert_eq!(Status::from_str("FINISHED"), Some(Status::Finished));
        assert_eq!(Status::from_str("reading"), Some(Status::Reading));
        assert_eq!(Status::from_str("Not Started"), Some(Status::NotStarted));
        assert_eq!(Status::from_str("not-started"), Some(Status::NotStarted));
        assert_eq!(Status::from_str("unknown"), None);
    }

    #[test]
    fn test_status_round_trips_through_json() {
        let status = ReadingStatus {
            reading_status_id: "not-started".to_string(),
            status: Status::NotStarted,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains(r#""status":"Not started""#));
        let back: ReadingStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn test_book_without_collection_ids_deserializes_empty() {
        let json = r#"{
            "book_id": "book-1",
            "title": "Dune",
            "author_id": "author-1",
            "category_id": "science-fiction",
            "reading_status_id": "finished",
            "publisher": "Chilton Books",
            "isbn": "9780441013593",
            "pages": 412,
            "bookcover": ""
        }"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert!(book.collection_ids.is_empty());
    }
}
