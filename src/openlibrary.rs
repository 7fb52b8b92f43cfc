//! Open Library search client and result normalization.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::config::OpenLibraryConfig;
use crate::store::NewBook;

/// Fields requested from the search endpoint. Keeps payloads small and
/// pins the shape [`SearchResult`] decodes.
const SEARCH_FIELDS: &str =
    "key,title,author_name,first_publish_year,publisher,isbn,number_of_pages_median,cover_i";

/// Shorter queries are rejected by the caller before any request is made.
pub const MIN_QUERY_LEN: usize = 3;

/// Cover image sizes offered by the covers server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSize {
    Small,
    Medium,
    Large,
}

impl CoverSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverSize::Small => "S",
            CoverSize::Medium => "M",
            CoverSize::Large => "L",
        }
    }
}

/// One document from the search response. Every field is optional on
/// the wire; missing ones decode to their empty value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub key: String,
    pub title: String,
    pub author_name: Vec<String>,
    pub first_publish_year: Option<i32>,
    pub publisher: Vec<String>,
    pub isbn: Vec<String>,
    pub number_of_pages_median: Option<u32>,
    pub cover_i: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    #[serde(rename = "numFound")]
    #[allow(dead_code)]
    num_found: u64,
    docs: Vec<SearchResult>,
}

/// Client for the Open Library search API.
pub struct Client {
    agent: ureq::Agent,
    endpoint: String,
    covers_endpoint: String,
    limit: u32,
}

impl Client {
    pub fn new(config: &OpenLibraryConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            covers_endpoint: config.covers_endpoint.trim_end_matches('/').to_string(),
            limit: config.limit,
        }
    }

    /// Search for books. A blank query returns no results without a
    /// request; transport and decoding failures degrade to an empty
    /// list so lookups never break the caller.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        match self.fetch(query) {
            Ok(response) => response.docs,
            Err(e) => {
                warn!("Open Library search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }

    fn fetch(&self, query: &str) -> Result<SearchResponse> {
        let url = format!("{}/search.json", self.endpoint);
        let response = self
            .agent
            .get(&url)
            .query("q", query)
            .query("limit", &self.limit.to_string())
            .query("fields", SEARCH_FIELDS)
            .call()
            .map_err(|e| anyhow!("Open Library request failed: {}", e))?;

        response
            .into_json()
            .map_err(|e| anyhow!("Failed to parse Open Library response: {}", e))
    }

    /// Cover image URL for a cover id, or an empty string without one.
    pub fn cover_url(&self, cover_id: Option<i64>, size: CoverSize) -> String {
        match cover_id {
            Some(id) => format!("{}/b/id/{}-{}.jpg", self.covers_endpoint, id, size.as_str()),
            None => String::new(),
        }
    }

    /// Map a search result into a creatable book. The first author name
    /// becomes the first/last name pair, first publisher and ISBN win,
    /// and the large cover is linked when one exists. The book starts
    /// unread with no category; callers assign those.
    pub fn normalize(&self, result: &SearchResult) -> NewBook {
        let author_name = result
            .author_name
            .first()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown Author");
        let (author_first_name, author_last_name) = split_author_name(author_name);

        NewBook {
            title: result.title.clone(),
            author_first_name,
            author_last_name,
            category_id: String::new(),
            reading_status_id: "not-started".to_string(),
            publisher: result.publisher.first().cloned().unwrap_or_default(),
            isbn: result.isbn.first().cloned().unwrap_or_default(),
            pages: result.number_of_pages_median.unwrap_or(0),
            bookcover: self.cover_url(result.cover_i, CoverSize::Large),
            collection_ids: Vec::new(),
        }
    }
}

/// Split a display name on whitespace: the last token is the last name,
/// everything before it the first name. A single token is all first
/// name.
pub fn split_author_name(name: &str) -> (String, String) {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.as_slice() {
        [] | [_] => (name.trim().to_string(), String::new()),
        [init @ .., last] => (init.join(" "), (*last).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(&OpenLibraryConfig::default())
    }

    fn unreachable_client() -> Client {
        Client::new(&OpenLibraryConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            covers_endpoint: "http://127.0.0.1:1".to_string(),
            limit: 20,
            timeout_secs: 1,
        })
    }

    #[test]
    fn test_blank_queries_return_empty_without_a_request() {
        let client = unreachable_client();
        assert!(client.search("").is_empty());
        assert!(client.search("   ").is_empty());
    }

    #[test]
    fn test_transport_failure_degrades_to_empty() {
        let client = unreachable_client();
        assert!(client.search("dune").is_empty());
    }

    #[test]
    fn test_cover_url_formats_sizes() {
        let client = client();
        assert_eq!(
            client.cover_url(Some(258027), CoverSize::Medium),
            "https://covers.openlibrary.org/b/id/258027-M.jpg"
        );
        assert_eq!(client.cover_url(None, CoverSize::Large), "");
    }

    #[test]
    fn test_normalize_full_result() {
        let result = SearchResult {
            key: "/works/OL893415W".to_string(),
            title: "Dune".to_string(),
            author_name: vec!["Frank Herbert".to_string()],
            first_publish_year: Some(1965),
            publisher: vec!["Chilton Books".to_string(), "Ace".to_string()],
            isbn: vec!["9780441013593".to_string(), "0441013597".to_string()],
            number_of_pages_median: Some(412),
            cover_i: Some(258027),
        };

        let book = client().normalize(&result);
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author_first_name, "Frank");
        assert_eq!(book.author_last_name, "Herbert");
        assert_eq!(book.publisher, "Chilton Books");
        assert_eq!(book.isbn, "9780441013593");
        assert_eq!(book.pages, 412);
        assert_eq!(
            book.bookcover,
            "https://covers.openlibrary.org/b/id/258027-L.jpg"
        );
        assert_eq!(book.reading_status_id, "not-started");
        assert!(book.category_id.is_empty());
    }

    #[test]
    fn test_normalize_fills_missing_fields() {
        let book = client().normalize(&SearchResult {
            title: "Anonymous Work".to_string(),
            ..Default::default()
        });
        assert_eq!(book.author_first_name, "Unknown");
        assert_eq!(book.author_last_name, "Author");
        assert_eq!(book.publisher, "");
        assert_eq!(book.isbn, "");
        assert_eq!(book.pages, 0);
        assert_eq!(book.bookcover, "");
    }

    #[test]
    fn test_split_author_name_variants() {
        assert_eq!(
            split_author_name("Frank Herbert"),
            ("Frank".to_string(), "Herbert".to_string())
        );
        assert_eq!(
            split_author_name("Ursula K. Le Guin"),
            ("Ursula K. Le".to_string(), "Guin".to_string())
        );
        assert_eq!(split_author_name("Plato"), ("Plato".to_string(), String::new()));
    }

    #[test]
    fn test_search_response_decodes_partial_docs() {
        let json = r#"{
            "numFound": 2,
            "docs": [
                {"title": "Dune", "author_name": ["Frank Herbert"], "cover_i": 258027},
                {"key": "/works/OL1W"}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.docs.len(), 2);
        assert_eq!(response.docs[0].title, "Dune");
        assert!(response.docs[1].author_name.is_empty());
        assert_eq!(response.docs[1].number_of_pages_median, None);
    }
}
