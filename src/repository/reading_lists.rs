//! Reading lists repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{book::BookSummary, reading_list::ReadingList},
};

#[async_trait]
pub trait ReadingListsRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<ReadingList>;
    async fn for_user(&self, user_id: i32) -> AppResult<Vec<ReadingList>>;
    async fn create(&self, user_id: i32, name: &str) -> AppResult<ReadingList>;
    async fn rename(&self, id: i32, name: &str) -> AppResult<ReadingList>;
    async fn delete(&self, id: i32) -> AppResult<()>;
    async fn books(&self, list_id: i32) -> AppResult<Vec<BookSummary>>;
    async fn contains(&self, list_id: i32, book_id: i32) -> AppResult<bool>;
    async fn add_book(&self, list_id: i32, book_id: i32) -> AppResult<()>;
    /// Returns false when the book was not on the list
    async fn remove_book(&self, list_id: i32, book_id: i32) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgReadingListsRepository {
    pool: Pool<Postgres>,
}

impl PgReadingListsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingListsRepository for PgReadingListsRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<ReadingList> {
        sqlx::query_as::<_, ReadingList>("SELECT * FROM reading_lists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reading list with id {} not found", id)))
    }

    async fn for_user(&self, user_id: i32) -> AppResult<Vec<ReadingList>> {
        let lists = sqlx::query_as::<_, ReadingList>(
            "SELECT * FROM reading_lists WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    async fn create(&self, user_id: i32, name: &str) -> AppResult<ReadingList> {
        let list = sqlx::query_as::<_, ReadingList>(
            "INSERT INTO reading_lists (user_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(list)
    }

    async fn rename(&self, id: i32, name: &str) -> AppResult<ReadingList> {
        sqlx::query_as::<_, ReadingList>("UPDATE reading_lists SET name = $1 WHERE id = $2 RETURNING *")
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reading list with id {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reading_lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Reading list with id {} not found", id)));
        }
        Ok(())
    }

    async fn books(&self, list_id: i32) -> AppResult<Vec<BookSummary>> {
        let books = sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT b.id, b.title, b.isbn, b.publication_year, b.genre_id,
                   g.name AS genre_name, b.availability_status,
                   COALESCE(
                       ARRAY_AGG(TRIM(COALESCE(a.first_name, '') || ' ' || a.last_name) ORDER BY a.last_name)
                           FILTER (WHERE a.id IS NOT NULL),
                       ARRAY[]::TEXT[]
                   ) AS authors
            FROM reading_list_books rlb
            JOIN books b ON b.id = rlb.book_id
            LEFT JOIN genres g ON g.id = b.genre_id
            LEFT JOIN book_authors ba ON ba.book_id = b.id
            LEFT JOIN authors a ON a.id = ba.author_id
            WHERE rlb.reading_list_id = $1
            GROUP BY b.id, g.name, rlb.added_at
            ORDER BY rlb.added_at
            "#,
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn contains(&self, list_id: i32, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reading_list_books WHERE reading_list_id = $1 AND book_id = $2)",
        )
        .bind(list_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn add_book(&self, list_id: i32, book_id: i32) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO reading_list_books (reading_list_id, book_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(list_id)
        .bind(book_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_book(&self, list_id: i32, book_id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reading_list_books WHERE reading_list_id = $1 AND book_id = $2")
            .bind(list_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
