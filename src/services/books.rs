//! Catalog service for books

use std::collections::BTreeMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, BookQuery, BookSummary, CreateBook, UpdateBook},
        enums::AvailabilityStatus,
        review::average_rating,
    },
    repository::Repository,
};

const RECOMMENDATION_LIMIT: i64 = 10;

/// Most frequent genre id; ties go to the smallest id
pub fn most_frequent_genre(genre_ids: &[i32]) -> Option<i32> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for id in genre_ids {
        *counts.entry(*id).or_default() += 1;
    }
    // max_by_key keeps the last maximum, so walk ids from largest to smallest
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(id, _)| id)
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        self.repository.books.search(query).await
    }

    /// Book with its authors, genre, reviews and average rating
    pub async fn details(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let authors = self.repository.books.authors_of(id).await?;
        let genre = match book.genre_id {
            Some(genre_id) => Some(self.repository.genres.get_by_id(genre_id).await?),
            None => None,
        };
        let reviews = self.repository.reviews.for_book(id).await?;
        let average_rating = average_rating(&reviews);

        Ok(BookDetails {
            book,
            authors,
            genre,
            reviews,
            average_rating,
        })
    }

    async fn check_references(&self, genre_id: Option<i32>, author_ids: &[i32]) -> AppResult<()> {
        if let Some(genre_id) = genre_id {
            self.repository.genres.get_by_id(genre_id).await.map_err(|e| match e {
                AppError::NotFound(_) => AppError::Validation(format!("Unknown genre {}", genre_id)),
                other => other,
            })?;
        }
        for author_id in author_ids {
            self.repository.authors.get_by_id(*author_id).await.map_err(|e| match e {
                AppError::NotFound(_) => AppError::Validation(format!("Unknown author {}", author_id)),
                other => other,
            })?;
        }
        Ok(())
    }

    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        self.check_references(book.genre_id, &book.author_ids).await?;
        let created = self.repository.books.create(book).await?;
        tracing::info!(book_id = created.id, title = %created.title, "Book created");
        Ok(created)
    }

    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        self.check_references(book.genre_id, book.author_ids.as_deref().unwrap_or(&[]))
            .await?;
        self.repository.books.update(id, book).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Take a book out of circulation or put it back
    pub async fn set_availability(&self, id: i32, status: AvailabilityStatus) -> AppResult<Book> {
        let mut book = self.repository.books.get_by_id(id).await?;

        let allowed = matches!(
            (book.availability_status, status),
            (AvailabilityStatus::Available, AvailabilityStatus::UnAvailable)
                | (AvailabilityStatus::UnAvailable, AvailabilityStatus::Available)
        );
        if !allowed {
            return Err(AppError::InvalidState(format!(
                "Cannot change availability from {} to {}",
                book.availability_status, status
            )));
        }
        if self.repository.transactions.active_for_book(id).await?.is_some() {
            return Err(AppError::InvalidState(format!(
                "Book {} has an active transaction",
                id
            )));
        }

        self.repository.books.set_status(id, status).await?;
        book.availability_status = status;
        tracing::info!(book_id = id, status = %status, "Availability changed");
        Ok(book)
    }

    /// Available books in the patron's favourite genre they have not borrowed yet
    pub async fn recommendations(&self, patron_id: i32) -> AppResult<Vec<BookSummary>> {
        let history = self.repository.books.genre_history(patron_id).await?;
        match most_frequent_genre(&history) {
            Some(genre_id) => {
                self.repository
                    .books
                    .recommend(genre_id, patron_id, RECOMMENDATION_LIMIT)
                    .await
            }
            None => Ok(vec![]),
        }
    }
}
