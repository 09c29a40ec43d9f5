//! Authors repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, CreateAuthor, UpdateAuthor},
};

#[async_trait]
pub trait AuthorsRepository: Send + Sync {
    async fn list(&self, name: Option<String>) -> AppResult<Vec<Author>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Author>;
    async fn create(&self, author: &CreateAuthor) -> AppResult<Author>;
    async fn update(&self, id: i32, author: &UpdateAuthor) -> AppResult<Author>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgAuthorsRepository {
    pool: Pool<Postgres>,
}

impl PgAuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorsRepository for PgAuthorsRepository {
    async fn list(&self, name: Option<String>) -> AppResult<Vec<Author>> {
        let authors = match name {
            Some(name) => {
                sqlx::query_as::<_, Author>(
                    r#"
                    SELECT * FROM authors
                    WHERE LOWER(last_name) LIKE $1 OR LOWER(COALESCE(first_name, '')) LIKE $1
                    ORDER BY last_name, first_name
                    "#,
                )
                .bind(format!("%{}%", name.to_lowercase()))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Author>("SELECT * FROM authors ORDER BY last_name, first_name")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(authors)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    async fn create(&self, author: &CreateAuthor) -> AppResult<Author> {
        let created = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, biography)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(&author.biography)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, id: i32, author: &UpdateAuthor) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET
                first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name),
                biography = COALESCE($3, biography)
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(&author.biography)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        Ok(())
    }
}
