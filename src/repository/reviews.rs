//! Reviews repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::review::{CreateReview, Review, UpdateReview},
};

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.book_id, r.user_id, u.username, r.rating, r.comment, r.created_at
    FROM reviews r
    JOIN users u ON u.id = r.user_id
"#;

#[async_trait]
pub trait ReviewsRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Review>;
    async fn for_book(&self, book_id: i32) -> AppResult<Vec<Review>>;
    async fn find(&self, book_id: i32, user_id: i32) -> AppResult<Option<Review>>;
    async fn create(&self, book_id: i32, user_id: i32, review: &CreateReview) -> AppResult<Review>;
    async fn update(&self, id: i32, review: &UpdateReview) -> AppResult<Review>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgReviewsRepository {
    pool: Pool<Postgres>,
}

impl PgReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewsRepository for PgReviewsRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Review> {
        let query = format!("{} WHERE r.id = $1", REVIEW_SELECT);
        sqlx::query_as::<_, Review>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))
    }

    async fn for_book(&self, book_id: i32) -> AppResult<Vec<Review>> {
        let query = format!("{} WHERE r.book_id = $1 ORDER BY r.created_at DESC", REVIEW_SELECT);
        let reviews = sqlx::query_as::<_, Review>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    async fn find(&self, book_id: i32, user_id: i32) -> AppResult<Option<Review>> {
        let query = format!("{} WHERE r.book_id = $1 AND r.user_id = $2", REVIEW_SELECT);
        let review = sqlx::query_as::<_, Review>(&query)
            .bind(book_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn create(&self, book_id: i32, user_id: i32, review: &CreateReview) -> AppResult<Review> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO reviews (book_id, user_id, rating, comment) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(book_id)
        .bind(user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    async fn update(&self, id: i32, review: &UpdateReview) -> AppResult<Review> {
        let result = sqlx::query(
            r#"
            UPDATE reviews SET
                rating = COALESCE($1, rating),
                comment = COALESCE($2, comment)
            WHERE id = $3
            "#,
        )
        .bind(review.rating)
        .bind(&review.comment)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Review with id {} not found", id)));
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Review with id {} not found", id)));
        }
        Ok(())
    }
}
