//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::AuthorRef,
        book::{Book, BookQuery, BookSummary, CreateBook, UpdateBook},
        enums::AvailabilityStatus,
    },
};

/// Book summary projection, followed by an optional WHERE clause and the GROUP BY
const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.isbn, b.publication_year, b.genre_id,
           g.name AS genre_name, b.availability_status,
           COALESCE(
               ARRAY_AGG(TRIM(COALESCE(a.first_name, '') || ' ' || a.last_name) ORDER BY a.last_name)
                   FILTER (WHERE a.id IS NOT NULL),
               ARRAY[]::TEXT[]
           ) AS authors
    FROM books b
    LEFT JOIN genres g ON g.id = b.genre_id
    LEFT JOIN book_authors ba ON ba.book_id = b.id
    LEFT JOIN authors a ON a.id = ba.author_id
"#;

const SUMMARY_GROUP_BY: &str = "GROUP BY b.id, g.name";

#[async_trait]
pub trait BooksRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    /// Paginated search; returns the page and the total match count
    async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)>;

    async fn authors_of(&self, book_id: i32) -> AppResult<Vec<AuthorRef>>;

    async fn by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>>;

    async fn create(&self, book: &CreateBook) -> AppResult<Book>;

    async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book>;

    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn set_status(&self, id: i32, status: AvailabilityStatus) -> AppResult<()>;

    /// Genre of the book behind each of the patron's transactions, one entry per transaction
    async fn genre_history(&self, patron_id: i32) -> AppResult<Vec<i32>>;

    /// Available books of a genre the patron never had a transaction for
    async fn recommend(&self, genre_id: i32, patron_id: i32, limit: i64) -> AppResult<Vec<BookSummary>>;
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn replace_authors(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        book_id: i32,
        author_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        for author_id in author_ids {
            sqlx::query(
                "INSERT INTO book_authors (book_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(book_id)
            .bind(author_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref title) = query.title {
            params.push(format!("%{}%", title.to_lowercase()));
            conditions.push(format!("LOWER(b.title) LIKE ${}", params.len()));
        }

        if let Some(ref author) = query.author {
            params.push(format!("%{}%", author.to_lowercase()));
            conditions.push(format!(
                r#"EXISTS (
                    SELECT 1 FROM book_authors ba2
                    JOIN authors a2 ON a2.id = ba2.author_id
                    WHERE ba2.book_id = b.id
                      AND (LOWER(a2.last_name) LIKE ${n} OR LOWER(COALESCE(a2.first_name, '')) LIKE ${n})
                )"#,
                n = params.len()
            ));
        }

        if let Some(genre_id) = query.genre_id {
            params.push(genre_id.to_string());
            conditions.push(format!("b.genre_id = CAST(${} AS INTEGER)", params.len()));
        }

        if let Some(ref isbn) = query.isbn {
            params.push(isbn.replace('-', ""));
            conditions.push(format!("REPLACE(b.isbn, '-', '') = ${}", params.len()));
        }

        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("b.availability_status = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM books b {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} {} ORDER BY b.title, b.id LIMIT {} OFFSET {}",
            SUMMARY_SELECT,
            where_clause,
            SUMMARY_GROUP_BY,
            query.per_page(),
            query.offset()
        );
        let mut select_builder = sqlx::query_as::<_, BookSummary>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let books = select_builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    async fn authors_of(&self, book_id: i32) -> AppResult<Vec<AuthorRef>> {
        let authors = sqlx::query_as::<_, AuthorRef>(
            r#"
            SELECT a.id, a.first_name, a.last_name
            FROM authors a
            JOIN book_authors ba ON ba.author_id = a.id
            WHERE ba.book_id = $1
            ORDER BY a.last_name, a.first_name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    async fn by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>> {
        let query = format!(
            "{} WHERE b.id IN (SELECT book_id FROM book_authors WHERE author_id = $1) {} ORDER BY b.title",
            SUMMARY_SELECT, SUMMARY_GROUP_BY
        );
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, isbn, description, publisher, publication_year, genre_id, availability_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(&book.publisher)
        .bind(book.publication_year)
        .bind(book.genre_id)
        .bind(AvailabilityStatus::Available)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_authors(&mut tx, created.id, &book.author_ids).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($1, title),
                isbn = COALESCE($2, isbn),
                description = COALESCE($3, description),
                publisher = COALESCE($4, publisher),
                publication_year = COALESCE($5, publication_year),
                genre_id = COALESCE($6, genre_id)
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(&book.publisher)
        .bind(book.publication_year)
        .bind(book.genre_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if let Some(ref author_ids) = book.author_ids {
            Self::replace_authors(&mut tx, id, author_ids).await?;
        }
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn set_status(&self, id: i32, status: AvailabilityStatus) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET availability_status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn genre_history(&self, patron_id: i32) -> AppResult<Vec<i32>> {
        let genres = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT b.genre_id
            FROM book_transactions t
            JOIN books b ON b.id = t.book_id
            WHERE t.patron_id = $1 AND b.genre_id IS NOT NULL
            "#,
        )
        .bind(patron_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    async fn recommend(&self, genre_id: i32, patron_id: i32, limit: i64) -> AppResult<Vec<BookSummary>> {
        let query = format!(
            r#"{}
            WHERE b.genre_id = $1
              AND b.availability_status = 'Available'
              AND NOT EXISTS (
                  SELECT 1 FROM book_transactions t WHERE t.book_id = b.id AND t.patron_id = $2
              )
            {}
            ORDER BY b.created_at DESC
            LIMIT $3"#,
            SUMMARY_SELECT, SUMMARY_GROUP_BY
        );
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(genre_id)
            .bind(patron_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }
}
