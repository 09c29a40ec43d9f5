//! Book reviews service

use crate::{
    error::{AppError, AppResult},
    models::review::{CreateReview, Review, UpdateReview},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
}

impl ReviewsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn for_book(&self, book_id: i32) -> AppResult<Vec<Review>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.reviews.for_book(book_id).await
    }

    /// One review per patron and book
    pub async fn add(&self, book_id: i32, user_id: i32, review: &CreateReview) -> AppResult<Review> {
        self.repository.books.get_by_id(book_id).await?;
        if self.repository.reviews.find(book_id, user_id).await?.is_some() {
            return Err(AppError::Conflict("You have already reviewed this book".to_string()));
        }

        let created = self.repository.reviews.create(book_id, user_id, review).await?;
        tracing::info!(review_id = created.id, book_id, user_id, rating = created.rating, "Review added");
        Ok(created)
    }

    pub async fn update(&self, user_id: i32, review_id: i32, review: &UpdateReview) -> AppResult<Review> {
        let existing = self.repository.reviews.get_by_id(review_id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Authorization("You can only edit your own reviews".to_string()));
        }
        self.repository.reviews.update(review_id, review).await
    }

    /// Authors delete their own reviews; staff may delete any
    pub async fn delete(&self, user_id: i32, is_staff: bool, review_id: i32) -> AppResult<()> {
        let existing = self.repository.reviews.get_by_id(review_id).await?;
        if existing.user_id != user_id && !is_staff {
            return Err(AppError::Authorization("You can only delete your own reviews".to_string()));
        }
        self.repository.reviews.delete(review_id).await
    }
}
