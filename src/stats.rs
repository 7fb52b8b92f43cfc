//! Aggregate statistics over the library.

use serde::Serialize;

use crate::store::{BookWithDetails, Review, Status};

/// Rollup counters for the library dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_books: usize,
    pub finished_books: usize,
    pub currently_reading: usize,
    pub total_pages_read: u64,
    pub average_rating: f64,
    pub reviews_count: usize,
}

/// Compute statistics from hydrated books and the full review set.
///
/// A book's pages count once it is finished, as a whole. The average
/// rating spans every review, rounded to one decimal, and is 0 when
/// there are no reviews. Pure; derived values are never stored.
pub fn compute_stats(books: &[BookWithDetails], reviews: &[Review]) -> Stats {
    let finished_books = books
        .iter()
        .filter(|b| b.reading_status.status == Status::Finished)
        .count();
    let currently_reading = books
        .iter()
        .filter(|b| b.reading_status.status == Status::Reading)
        .count();
    let total_pages_read = books
        .iter()
        .filter(|b| b.reading_status.status == Status::Finished)
        .map(|b| b.book.pages as u64)
        .sum();
    let average_rating = if reviews.is_empty() {
        0.0
    } else {
        let sum: f64 = reviews.iter().map(|r| r.rating as f64).sum();
        (sum / reviews.len() as f64 * 10.0).round() / 10.0
    };

    Stats {
        total_books: books.len(),
        finished_books,
        currently_reading,
        total_pages_read,
        average_rating,
        reviews_count: reviews.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Author, Book, Category, ReadingStatus};

    fn book_with(status: Status, pages: u32) -> BookWithDetails {
        let book = Book {
            book_id: crate::store::new_id("book"),
            title: "Fixture".to_string(),
            author_id: String::new(),
            category_id: String::new(),
            reading_status_id: status.id().to_string(),
            publisher: String::new(),
            isbn: String::new(),
            pages,
            bookcover: String::new(),
            collection_ids: Vec::new(),
        };
        BookWithDetails {
            book,
            author: Author::unknown(),
            category: Category::uncategorized(),
            reading_status: ReadingStatus {
                reading_status_id: status.id().to_string(),
                status,
            },
            review: None,
            collections: Vec::new(),
        }
    }

    fn review(rating: f32) -> Review {
        Review {
            review_id: crate::store::new_id("review"),
            book_id: "book-1".to_string(),
            rating,
            comment: String::new(),
        }
    }

    #[test]
    fn test_compute_stats_counts_and_sums() {
        let books = vec![
            book_with(Status::Finished, 100),
            book_with(Status::Reading, 50),
            book_with(Status::Finished, 200),
        ];
        let reviews = vec![review(4.0), review(5.0)];

        let stats = compute_stats(&books, &reviews);
        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.finished_books, 2);
        assert_eq!(stats.currently_reading, 1);
        assert_eq!(stats.total_pages_read, 300);
        assert_eq!(stats.average_rating, 4.5);
        assert_eq!(stats.reviews_count, 2);
    }

    #[test]
    fn test_compute_stats_on_empty_library() {
        let stats = compute_stats(&[], &[]);
        assert_eq!(stats, Stats::default());
        assert_eq!(stats.average_rating, 0.0);
    }

    #[test]
    fn test_unread_pages_do_not_count() {
        let books = vec![
            book_with(Status::NotStarted, 400),
            book_with(Status::Reading, 250),
        ];
        let stats = compute_stats(&books, &[]);
        assert_eq!(stats.total_pages_read, 0);
    }

    #[test]
    fn test_average_rating_rounds_to_one_decimal() {
        let reviews = vec![review(3.5), review(4.0)];
        let stats = compute_stats(&[], &reviews);
        assert_eq!(stats.average_rating, 3.8);

        let reviews = vec![review(4.0), review(4.0), review(5.0)];
        let stats = compute_stats(&[], &reviews);
        assert_eq!(stats.average_rating, 4.3);
    }
}
