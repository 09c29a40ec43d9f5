//! Book transactions repository for database operations
//!
//! Every lifecycle write touches two rows (the transaction and its book) and
//! runs inside a single database transaction so the book status never drifts
//! from the transaction type.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{AvailabilityStatus, TransactionType},
        transaction::{BookTransaction, NewReservation, TransactionDetails, TransactionFilter},
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT t.id, t.book_id, b.title AS book_title, t.patron_id,
           u.username AS patron_username,
           NULLIF(TRIM(COALESCE(u.first_name, '') || ' ' || COALESCE(u.last_name, '')), '') AS patron_name,
           t.transaction_date, t.due_date, t.transaction_type, t.is_returned,
           (t.transaction_type = 'Borrowed' AND NOT t.is_returned AND t.due_date < NOW()) AS is_overdue
    FROM book_transactions t
    JOIN books b ON b.id = t.book_id
    JOIN users u ON u.id = t.patron_id
"#;

#[async_trait]
pub trait TransactionsRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<BookTransaction>;

    /// Every transaction, returned or not
    async fn list_all(&self) -> AppResult<Vec<BookTransaction>>;

    async fn search(&self, filter: &TransactionFilter) -> AppResult<Vec<TransactionDetails>>;

    async fn for_patron(&self, patron_id: i32) -> AppResult<Vec<TransactionDetails>>;

    /// The reserved or borrowed transaction currently holding the book
    async fn active_for_book(&self, book_id: i32) -> AppResult<Option<BookTransaction>>;

    /// Inserts a Reserved transaction and flips the book to Reserved.
    /// Fails with `Unavailable` when the book stopped being Available.
    async fn create_reservation(&self, reservation: &NewReservation) -> AppResult<BookTransaction>;

    /// Persists the transaction and sets its book to the matching status
    async fn save(&self, transaction: &BookTransaction) -> AppResult<()>;

    /// Removes the transaction, releasing its book when still active
    async fn delete(&self, transaction: &BookTransaction) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgTransactionsRepository {
    pool: Pool<Postgres>,
}

impl PgTransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionsRepository for PgTransactionsRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<BookTransaction> {
        sqlx::query_as::<_, BookTransaction>("SELECT * FROM book_transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction with id {} not found", id)))
    }

    async fn list_all(&self) -> AppResult<Vec<BookTransaction>> {
        let transactions =
            sqlx::query_as::<_, BookTransaction>("SELECT * FROM book_transactions ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(transactions)
    }

    async fn search(&self, filter: &TransactionFilter) -> AppResult<Vec<TransactionDetails>> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(kind) = filter.transaction_type {
            params.push(kind.as_str().to_string());
            conditions.push(format!("t.transaction_type = ${}", params.len()));
        }

        if let Some(ref name) = filter.patron_name {
            params.push(format!("%{}%", name.to_lowercase()));
            conditions.push(format!(
                "(LOWER(u.username) LIKE ${n} OR LOWER(COALESCE(u.first_name, '')) LIKE ${n} OR LOWER(COALESCE(u.last_name, '')) LIKE ${n})",
                n = params.len()
            ));
        }

        if let Some(ref title) = filter.book_title {
            params.push(format!("%{}%", title.to_lowercase()));
            conditions.push(format!("LOWER(b.title) LIKE ${}", params.len()));
        }

        if let Some(is_returned) = filter.is_returned {
            params.push(is_returned.to_string());
            conditions.push(format!("t.is_returned = CAST(${} AS BOOLEAN)", params.len()));
        }

        if filter.overdue_only.unwrap_or(false) {
            conditions.push(
                "(t.transaction_type = 'Borrowed' AND NOT t.is_returned AND t.due_date < NOW())".to_string(),
            );
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "{} {} ORDER BY t.transaction_date DESC, t.id DESC",
            DETAILS_SELECT, where_clause
        );
        let mut builder = sqlx::query_as::<_, TransactionDetails>(&query);
        for param in &params {
            builder = builder.bind(param);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    async fn for_patron(&self, patron_id: i32) -> AppResult<Vec<TransactionDetails>> {
        let query = format!(
            "{} WHERE t.patron_id = $1 ORDER BY t.transaction_date DESC, t.id DESC",
            DETAILS_SELECT
        );
        let transactions = sqlx::query_as::<_, TransactionDetails>(&query)
            .bind(patron_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(transactions)
    }

    async fn active_for_book(&self, book_id: i32) -> AppResult<Option<BookTransaction>> {
        let transaction = sqlx::query_as::<_, BookTransaction>(
            r#"
            SELECT * FROM book_transactions
            WHERE book_id = $1 AND NOT is_returned
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(transaction)
    }

    async fn create_reservation(&self, reservation: &NewReservation) -> AppResult<BookTransaction> {
        let mut tx = self.pool.begin().await?;

        // The status guard serializes competing reservations on the book row
        let claimed = sqlx::query(
            "UPDATE books SET availability_status = $1 WHERE id = $2 AND availability_status = $3",
        )
        .bind(AvailabilityStatus::Reserved)
        .bind(reservation.book_id)
        .bind(AvailabilityStatus::Available)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::Unavailable(format!(
                "Book {} is not available",
                reservation.book_id
            )));
        }

        let created = sqlx::query_as::<_, BookTransaction>(
            r#"
            INSERT INTO book_transactions (book_id, patron_id, transaction_date, due_date, transaction_type, is_returned)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING *
            "#,
        )
        .bind(reservation.book_id)
        .bind(reservation.patron_id)
        .bind(reservation.transaction_date)
        .bind(reservation.due_date)
        .bind(TransactionType::Reserved)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn save(&self, transaction: &BookTransaction) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE book_transactions SET
                transaction_date = $1,
                due_date = $2,
                transaction_type = $3,
                is_returned = $4
            WHERE id = $5
            "#,
        )
        .bind(transaction.transaction_date)
        .bind(transaction.due_date)
        .bind(transaction.transaction_type)
        .bind(transaction.is_returned)
        .bind(transaction.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Transaction with id {} not found",
                transaction.id
            )));
        }

        sqlx::query("UPDATE books SET availability_status = $1 WHERE id = $2")
            .bind(AvailabilityStatus::from(transaction.transaction_type))
            .bind(transaction.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, transaction: &BookTransaction) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM book_transactions WHERE id = $1")
            .bind(transaction.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Transaction with id {} not found",
                transaction.id
            )));
        }

        if transaction.is_active() {
            sqlx::query("UPDATE books SET availability_status = $1 WHERE id = $2")
                .bind(AvailabilityStatus::Available)
                .bind(transaction.book_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
