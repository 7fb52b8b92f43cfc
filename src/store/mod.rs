//! Persistent store for the six entity collections.
//!
//! Every collection (books, authors, categories, collections, reading
//! statuses, reviews) lives in one row of the `slots` table as a JSON
//! array. Operations load the whole array, change it in memory and write
//! it back; each write replaces its slot atomically.
//!
//! Reads never fail: a missing or malformed slot falls back to that
//! slot's defaults. Writes that fail are logged and dropped.

pub mod models;
mod schema;

use anyhow::Result;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{error, warn};

pub use models::{
    new_id, Author, Book, BookWithDetails, Category, Collection, NewBook, ReadingStatus, Review,
    Status,
};

use schema::{
    AUTHORS_KEY, BOOKS_KEY, CATEGORIES_KEY, COLLECTIONS_KEY, READING_STATUSES_KEY, REVIEWS_KEY,
    SCHEMA,
};

/// Failure of a single slot read or write. Absorbed at the store
/// boundary: callers get defaults instead of errors.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("malformed slot payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle to one store. Opening is explicit; dropping the handle closes
/// the underlying connection.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create the slot table and seed every slot that does not exist yet.
    /// Safe to call on every start; existing data is never touched.
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.seed_slot(BOOKS_KEY, &Vec::<Book>::new())?;
        self.seed_slot(AUTHORS_KEY, &Vec::<Author>::new())?;
        self.seed_slot(CATEGORIES_KEY, &schema::default_categories())?;
        self.seed_slot(COLLECTIONS_KEY, &schema::default_collections())?;
        self.seed_slot(READING_STATUSES_KEY, &schema::default_reading_statuses())?;
        self.seed_slot(REVIEWS_KEY, &Vec::<Review>::new())?;
        Ok(())
    }

    fn seed_slot<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let value = serde_json::to_string(items)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO slots (key, value) VALUES (?, ?)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    // ========================================================================
    // Slot primitives
    // ========================================================================

    /// Read a slot, falling back to `default` when it is missing or
    /// cannot be decoded.
    fn read_slot<T: DeserializeOwned>(&self, key: &str, default: fn() -> Vec<T>) -> Vec<T> {
        match self.try_read_slot(key) {
            Ok(Some(items)) => items,
            Ok(None) => default(),
            Err(e) => {
                warn!("falling back to defaults for slot {}: {}", key, e);
                default()
            }
        }
    }

    fn try_read_slot<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>, SlotError> {
        let result = self.conn.query_row(
            "SELECT value FROM slots WHERE key = ?",
            [key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(serde_json::from_str(&value)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace a slot's contents. Failures are logged and dropped; the
    /// caller proceeds as if the write had succeeded.
    fn write_slot<T: Serialize>(&self, key: &str, items: &[T]) {
        if let Err(e) = self.try_write_slot(key, items) {
            error!("dropping failed write to slot {}: {}", key, e);
        }
    }

    fn try_write_slot<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), SlotError> {
        let value = serde_json::to_string(items)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO slots (key, value) VALUES (?, ?)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    // ========================================================================
    // Book operations
    // ========================================================================

    pub fn get_books(&self) -> Vec<Book> {
        self.read_slot(BOOKS_KEY, Vec::new)
    }

    pub fn get_book(&self, book_id: &str) -> Option<Book> {
        self.get_books().into_iter().find(|b| b.book_id == book_id)
    }

    /// Insert or overwrite a book, matched by id. Duplicate collection
    /// ids collapse to one, keeping the first occurrence.
    pub fn save_book(&self, book: &Book) {
        let mut book = book.clone();
        let mut seen = HashSet::new();
        book.collection_ids.retain(|id| seen.insert(id.clone()));

        let mut books = self.get_books();
        match books.iter().position(|b| b.book_id == book.book_id) {
            Some(index) => books[index] = book,
            None => books.push(book),
        }
        self.write_slot(BOOKS_KEY, &books);
    }

    /// Create a book from a payload, reusing or creating its author.
    pub fn add_book(&self, new_book: NewBook) -> Book {
        let author =
            self.find_or_create_author(&new_book.author_first_name, &new_book.author_last_name);
        let book = Book {
            book_id: new_id("book"),
            title: new_book.title,
            author_id: author.author_id,
            category_id: new_book.category_id,
            reading_status_id: new_book.reading_status_id,
            publisher: new_book.publisher,
            isbn: new_book.isbn,
            pages: new_book.pages,
            bookcover: new_book.bookcover,
            collection_ids: new_book.collection_ids,
        };
        self.save_book(&book);
        book
    }

    /// Remove a book and any review that points at it. Removing an
    /// unknown id is a no-op.
    pub fn delete_book(&self, book_id: &str) {
        let mut books = self.get_books();
        books.retain(|b| b.book_id != book_id);
        self.write_slot(BOOKS_KEY, &books);

        let mut reviews = self.get_reviews();
        reviews.retain(|r| r.book_id != book_id);
        self.write_slot(REVIEWS_KEY, &reviews);
    }

    // ========================================================================
    // Author operations
    // ========================================================================

    pub fn get_authors(&self) -> Vec<Author> {
        self.read_slot(AUTHORS_KEY, Vec::new)
    }

    pub fn save_author(&self, author: &Author) {
        let mut authors = self.get_authors();
        match authors.iter().position(|a| a.author_id == author.author_id) {
            Some(index) => authors[index] = author.clone(),
            None => authors.push(author.clone()),
        }
        self.write_slot(AUTHORS_KEY, &authors);
    }

    /// Match on the name pair ignoring case; create when absent.
    pub fn find_or_create_author(&self, first_name: &str, last_name: &str) -> Author {
        let authors = self.get_authors();
        if let Some(existing) = authors.iter().find(|a| {
            a.first_name.to_lowercase() == first_name.to_lowercase()
                && a.last_name.to_lowercase() == last_name.to_lowercase()
        }) {
            return existing.clone();
        }
        let author = Author {
            author_id: new_id("author"),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        self.save_author(&author);
        author
    }

    // ========================================================================
    // Category operations
    // ========================================================================

    pub fn get_categories(&self) -> Vec<Category> {
        self.read_slot(CATEGORIES_KEY, schema::default_categories)
    }

    pub fn save_category(&self, category: &Category) {
        let mut categories = self.get_categories();
        match categories
            .iter()
            .position(|c| c.category_id == category.category_id)
        {
            Some(index) => categories[index] = category.clone(),
            None => categories.push(category.clone()),
        }
        self.write_slot(CATEGORIES_KEY, &categories);
    }

    /// Match on the name ignoring case; create when absent.
    pub fn find_or_create_category(&self, name: &str) -> Category {
        let categories = self.get_categories();
        if let Some(existing) = categories
            .iter()
            .find(|c| c.name.to_lowercase() == name.to_lowercase())
        {
            return existing.clone();
        }
        let category = Category {
            category_id: new_id("category"),
            name: name.to_string(),
        };
        self.save_category(&category);
        category
    }

    // ========================================================================
    // Collection operations
    // ========================================================================

    pub fn get_collections(&self) -> Vec<Collection> {
        self.read_slot(COLLECTIONS_KEY, schema::default_collections)
    }

    pub fn save_collection(&self, collection: &Collection) {
        let mut collections = self.get_collections();
        match collections
            .iter()
            .position(|c| c.collection_id == collection.collection_id)
        {
            Some(index) => collections[index] = collection.clone(),
            None => collections.push(collection.clone()),
        }
        self.write_slot(COLLECTIONS_KEY, &collections);
    }

    /// Remove a collection and strip its id from every book.
    pub fn delete_collection(&self, collection_id: &str) {
        let mut collections = self.get_collections();
        collections.retain(|c| c.collection_id != collection_id);
        self.write_slot(COLLECTIONS_KEY, &collections);

        let mut books = self.get_books();
        for book in &mut books {
            book.collection_ids.retain(|id| id != collection_id);
        }
        self.write_slot(BOOKS_KEY, &books);
    }

    // ========================================================================
    // Reading status operations
    // ========================================================================

    pub fn get_reading_statuses(&self) -> Vec<ReadingStatus> {
        self.read_slot(READING_STATUSES_KEY, schema::default_reading_statuses)
    }

    // ========================================================================
    // Review operations
    // ========================================================================

    pub fn get_reviews(&self) -> Vec<Review> {
        self.read_slot(REVIEWS_KEY, Vec::new)
    }

    pub fn get_review_by_book(&self, book_id: &str) -> Option<Review> {
        self.get_reviews().into_iter().find(|r| r.book_id == book_id)
    }

    /// Insert or overwrite a review, matched by id. Any other review of
    /// the same book is dropped; a book carries at most one review.
    pub fn save_review(&self, review: &Review) {
        let mut reviews = self.get_reviews();
        match reviews.iter().position(|r| r.review_id == review.review_id) {
            Some(index) => reviews[index] = review.clone(),
            None => reviews.push(review.clone()),
        }
        reviews.retain(|r| r.review_id == review.review_id || r.book_id != review.book_id);
        self.write_slot(REVIEWS_KEY, &reviews);
    }

    /// Rate a book, updating the existing review in place when there is
    /// one so its identifier stays stable.
    pub fn upsert_review(&self, book_id: &str, rating: f32, comment: &str) -> Review {
        let review = Review {
            review_id: self
                .get_review_by_book(book_id)
                .map(|r| r.review_id)
                .unwrap_or_else(|| new_id("review")),
            book_id: book_id.to_string(),
            rating,
            comment: comment.to_string(),
        };
        self.save_review(&review);
        review
    }

    pub fn delete_review(&self, review_id: &str) {
        let mut reviews = self.get_reviews();
        reviews.retain(|r| r.review_id != review_id);
        self.write_slot(REVIEWS_KEY, &reviews);
    }
}
