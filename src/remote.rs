//! Client for the shelf REST service and one-way import into the store.
//!
//! The local store stays the source of truth. Pulling copies remote
//! books that are not present yet (matched by ISBN) into the store;
//! nothing is written back and conflicts are out of scope.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::RemoteConfig;
use crate::openlibrary::split_author_name;
use crate::store::{BookWithDetails, NewBook, Status, Store};

/// Standard response wrapper used by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
}

/// A book as served by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiBook {
    /// Remote identifier; 0 for books that only exist locally.
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub isbn: String,
    pub status: String,
    pub pages: u32,
    pub pages_read: u32,
    pub publisher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub reviews: Vec<ApiReview>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiReview {
    pub rating: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Client for the shelf service.
pub struct Client {
    agent: ureq::Agent,
    base_url: String,
}

impl Client {
    pub fn new(config: &RemoteConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch every book the remote service knows.
    pub fn books(&self) -> Result<Vec<ApiBook>> {
        let url = format!("{}/api/books", self.base_url);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| anyhow!("shelf service request failed: {}", e))?;

        let envelope: Envelope<Vec<ApiBook>> = response
            .into_json()
            .map_err(|e| anyhow!("failed to parse shelf service response: {}", e))?;

        if !envelope.success {
            return Err(anyhow!("shelf service reported failure"));
        }
        Ok(envelope.data)
    }
}

/// Pull remote books into the store. Returns how many were added.
pub fn import_books(store: &Store, client: &Client) -> Result<usize> {
    let books = client.books()?;
    info!("pulled {} books from the shelf service", books.len());
    Ok(import_all(store, books))
}

/// Import the given remote books, skipping any whose ISBN already
/// exists locally. The first rated remote review comes along.
pub fn import_all(store: &Store, books: Vec<ApiBook>) -> usize {
    let mut imported = 0;
    for api_book in books {
        if has_isbn(store, &api_book.isbn) {
            debug!("skipping {:?}, ISBN already present", api_book.title);
            continue;
        }
        let book = store.add_book(to_new_book(store, &api_book));
        if let Some(review) = api_book.reviews.iter().find(|r| r.rating > 0.0) {
            store.upsert_review(
                &book.book_id,
                review.rating,
                review.comment.as_deref().unwrap_or(""),
            );
        }
        imported += 1;
    }
    imported
}

fn has_isbn(store: &Store, isbn: &str) -> bool {
    !isbn.is_empty() && store.get_books().iter().any(|b| b.isbn == isbn)
}

fn to_new_book(store: &Store, api_book: &ApiBook) -> NewBook {
    let (author_first_name, author_last_name) = split_author_name(&api_book.author);
    let category_id = if api_book.category.trim().is_empty() {
        String::new()
    } else {
        store.find_or_create_category(&api_book.category).category_id
    };
    let status = Status::from_str(&api_book.status).unwrap_or(Status::NotStarted);

    NewBook {
        title: api_book.title.clone(),
        author_first_name,
        author_last_name,
        category_id,
        reading_status_id: status.id().to_string(),
        publisher: api_book.publisher.clone(),
        isbn: api_book.isbn.clone(),
        pages: api_book.pages,
        bookcover: api_book.cover_url.clone().unwrap_or_default(),
        collection_ids: Vec::new(),
    }
}

/// Project a hydrated book into the wire shape served by the API.
pub fn to_api_book(details: &BookWithDetails) -> ApiBook {
    let finished = details.reading_status.status == Status::Finished;
    ApiBook {
        id: 0,
        title: details.book.title.clone(),
        author: details.author_name(),
        category: details.category.name.clone(),
        isbn: details.book.isbn.clone(),
        status: details.reading_status.status.as_str().to_string(),
        pages: details.book.pages,
        pages_read: if finished { details.book.pages } else { 0 },
        publisher: details.book.publisher.clone(),
        cover_url: if details.book.bookcover.is_empty() {
            None
        } else {
            Some(details.book.bookcover.clone())
        },
        reviews: details
            .review
            .iter()
            .map(|r| ApiReview {
                rating: r.rating,
                comment: if r.comment.is_empty() {
                    None
                } else {
                    Some(r.comment.clone())
                },
            })
            .collect(),
    }
}
