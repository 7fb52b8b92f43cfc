//! Slot table schema and seed data.

use super::models::{Category, Collection, ReadingStatus, Status};

pub const SCHEMA: &str = r#"
-- Slots table: one row per entity collection.
-- The value is the whole collection as a JSON array; reads and writes
-- always move the entire array.
CREATE TABLE IF NOT EXISTS slots (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

// Slot keys, one per entity collection.
pub const BOOKS_KEY: &str = "shelfio_books";
pub const AUTHORS_KEY: &str = "shelfio_authors";
pub const CATEGORIES_KEY: &str = "shelfio_categories";
pub const COLLECTIONS_KEY: &str = "shelfio_collections";
pub const READING_STATUSES_KEY: &str = "shelfio_reading_statuses";
pub const REVIEWS_KEY: &str = "shelfio_reviews";

/// The three fixed reading statuses. Seeded once, never edited.
pub const DEFAULT_READING_STATUSES: &[(&str, Status)] = &[
    ("not-started", Status::NotStarted),
    ("reading", Status::Reading),
    ("finished", Status::Finished),
];

/// Starter categories: (id, display name).
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("crime", "Krimi & Thriller"),
    ("fantasy", "Fantasy"),
    ("novel", "Roman"),
    ("biography", "Biografie"),
    ("science-fiction", "Science-Fiction"),
    ("history", "Geschichte"),
    ("self-help", "Ratgeber"),
    ("other", "Sonstiges"),
];

/// Starter collections: (id, display name).
pub const DEFAULT_COLLECTIONS: &[(&str, &str)] = &[("favorites", "Favoriten")];

pub fn default_reading_statuses() -> Vec<ReadingStatus> {
    DEFAULT_READING_STATUSES
        .iter()
        .map(|(id, status)| ReadingStatus {
            reading_status_id: (*id).to_string(),
            status: *status,
        })
        .collect()
}

pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(id, name)| Category {
            category_id: (*id).to_string(),
            name: (*name).to_string(),
        })
        .collect()
}

pub fn default_collections() -> Vec<Collection> {
    DEFAULT_COLLECTIONS
        .iter()
        .map(|(id, name)| Collection {
            collection_id: (*id).to_string(),
            name: (*name).to_string(),
        })
        .collect()
}
