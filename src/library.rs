//! Read-side joins over the store.
//!
//! Books are stored normalized; everything here derives the joined
//! [`BookWithDetails`] view on demand. Dangling references resolve to
//! placeholder records instead of failing, so a half-broken store still
//! renders. Nothing in this module writes.

use crate::store::{
    Author, Book, BookWithDetails, Category, Collection, ReadingStatus, Review, Status, Store,
};

/// Find a record by predicate, substituting a placeholder when the
/// target is missing. All join fallbacks go through here.
fn resolve_or<T: Clone>(
    items: &[T],
    matches: impl Fn(&T) -> bool,
    placeholder: impl FnOnce() -> T,
) -> T {
    items
        .iter()
        .find(|item| matches(item))
        .cloned()
        .unwrap_or_else(placeholder)
}

/// One load of every related collection, shared across joins so a batch
/// hydration reads each slot once.
struct Related {
    authors: Vec<Author>,
    categories: Vec<Category>,
    statuses: Vec<ReadingStatus>,
    reviews: Vec<Review>,
    collections: Vec<Collection>,
}

impl Related {
    fn load(store: &Store) -> Self {
        Self {
            authors: store.get_authors(),
            categories: store.get_categories(),
            statuses: store.get_reading_statuses(),
            reviews: store.get_reviews(),
            collections: store.get_collections(),
        }
    }

    fn join(&self, book: Book) -> BookWithDetails {
        let author = resolve_or(
            &self.authors,
            |a: &Author| a.author_id == book.author_id,
            Author::unknown,
        );
        let category = resolve_or(
            &self.categories,
            |c: &Category| c.category_id == book.category_id,
            Category::uncategorized,
        );
        let reading_status = resolve_or(
            &self.statuses,
            |s: &ReadingStatus| s.reading_status_id == book.reading_status_id,
            ReadingStatus::not_started,
        );
        let review = self
            .reviews
            .iter()
            .find(|r| r.book_id == book.book_id)
            .cloned();
        let collections = self
            .collections
            .iter()
            .filter(|c| book.collection_ids.contains(&c.collection_id))
            .cloned()
            .collect();
        BookWithDetails {
            book,
            author,
            category,
            reading_status,
            review,
            collections,
        }
    }
}

/// Join one book with its related records.
/// Returns `None` only when the book itself does not exist.
pub fn hydrate(store: &Store, book_id: &str) -> Option<BookWithDetails> {
    let book = store.get_book(book_id)?;
    Some(Related::load(store).join(book))
}

/// Join every book in the store, in stored order.
pub fn hydrate_all(store: &Store) -> Vec<BookWithDetails> {
    let related = Related::load(store);
    store
        .get_books()
        .into_iter()
        .map(|book| related.join(book))
        .collect()
}

/// Books whose resolved reading state matches `status`.
pub fn books_with_status(store: &Store, status: Status) -> Vec<BookWithDetails> {
    hydrate_all(store)
        .into_iter()
        .filter(|b| b.reading_status.status == status)
        .collect()
}

/// Books in the named category, matched ignoring case.
pub fn books_in_category(store: &Store, name: &str) -> Vec<BookWithDetails> {
    let name = name.to_lowercase();
    hydrate_all(store)
        .into_iter()
        .filter(|b| b.category.name.to_lowercase() == name)
        .collect()
}

/// Case-insensitive search over titles and author names. A blank query
/// matches everything.
pub fn find_books(store: &Store, query: &str) -> Vec<BookWithDetails> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return hydrate_all(store);
    }
    hydrate_all(store)
        .into_iter()
        .filter(|b| {
            b.book.title.to_lowercase().contains(&needle)
                || b.author_name().to_lowercase().contains(&needle)
        })
        .collect()
}

/// The most recently added books, newest first.
pub fn recent_books(store: &Store, count: usize) -> Vec<BookWithDetails> {
    let mut books = hydrate_all(store);
    books.reverse();
    books.truncate(count);
    books
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewBook;

    fn seeded_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.initialize().unwrap();
        store
    }

    fn dune() -> NewBook {
        NewBook {
            title: "Dune".to_string(),
            author_first_name: "Frank".to_string(),
            author_last_name: "Herbert".to_string(),
            category_id: "science-fiction".to_string(),
            reading_status_id: "finished".to_string(),
            pages: 412,
            ..Default::default()
        }
    }

    #[test]
    fn test_hydrate_unknown_book_is_none() {
        let store = seeded_store();
        assert!(hydrate(&store, "book-missing").is_none());
    }

    #[test]
    fn test_hydrate_resolves_related_records() {
        let store = seeded_store();
        let mut book = store.add_book(dune());
        book.collection_ids = vec!["favorites".to_string()];
        store.save_book(&book);
        store.upsert_review(&book.book_id, 4.5, "a classic");

        let details = hydrate(&store, &book.book_id).unwrap();
        assert_eq!(details.author_name(), "Frank Herbert");
        assert_eq!(details.category.name, "Science-Fiction");
        assert_eq!(details.reading_status.status, Status::Finished);
        assert_eq!(details.review.as_ref().unwrap().rating, 4.5);
        assert_eq!(details.collections.len(), 1);
        assert_eq!(details.collections[0].name, "Favoriten");
    }

    #[test]
    fn test_hydrate_substitutes_placeholders() {
        let store = seeded_store();
        store.save_book(&crate::store::Book {
            book_id: "book-1".to_string(),
            title: "Orphan".to_string(),
            author_id: "author-missing".to_string(),
            category_id: "category-missing".to_string(),
            reading_status_id: "status-missing".to_string(),
            publisher: String::new(),
            isbn: String::new(),
            pages: 0,
            bookcover: String::new(),
            collection_ids: Vec::new(),
        });

        let details = hydrate(&store, "book-1").unwrap();
        assert_eq!(details.author.first_name, "Unknown");
        assert_eq!(details.author.last_name, "Author");
        assert_eq!(details.category.name, "Uncategorized");
        assert_eq!(details.reading_status.status, Status::NotStarted);
        assert!(details.review.is_none());
        assert!(details.collections.is_empty());
    }

    #[test]
    fn test_hydrate_all_keeps_stored_order() {
        let store = seeded_store();
        let first = store.add_book(dune());
        let second = store.add_book(NewBook {
            title: "Emma".to_string(),
            author_first_name: "Jane".to_string(),
            author_last_name: "Austen".to_string(),
            reading_status_id: "reading".to_string(),
            ..Default::default()
        });

        let all = hydrate_all(&store);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].book.book_id, first.book_id);
        assert_eq!(all[1].book.book_id, second.book_id);
    }

    #[test]
    fn test_books_with_status_filters() {
        let store = seeded_store();
        store.add_book(dune());
        store.add_book(NewBook {
            title: "Emma".to_string(),
            reading_status_id: "reading".to_string(),
            ..Default::default()
        });

        let finished = books_with_status(&store, Status::Finished);
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].book.title, "Dune");
    }

    #[test]
    fn test_books_in_category_ignores_case() {
        let store = seeded_store();
        store.add_book(dune());

        assert_eq!(books_in_category(&store, "SCIENCE-FICTION").len(), 1);
        assert!(books_in_category(&store, "Fantasy").is_empty());
    }

    #[test]
    fn test_find_books_matches_title_and_author() {
        let store = seeded_store();
        store.add_book(dune());
        store.add_book(NewBook {
            title: "Emma".to_string(),
            author_first_name: "Jane".to_string(),
            author_last_name: "Austen".to_string(),
            ..Default::default()
        });

        assert_eq!(find_books(&store, "herbert").len(), 1);
        assert_eq!(find_books(&store, "em").len(), 1);
        assert_eq!(find_books(&store, "  ").len(), 2);
        assert!(find_books(&store, "tolkien").is_empty());
    }

    #[test]
    fn test_recent_books_newest_first() {
        let store = seeded_store();
        store.add_book(dune());
        let latest = store.add_book(NewBook {
            title: "Emma".to_string(),
            ..Default::default()
        });

        let recent = recent_books(&store, 1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].book.book_id, latest.book_id);
    }
}
