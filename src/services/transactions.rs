//! Book transaction (lending) service

use chrono::{DateTime, Utc};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        enums::AvailabilityStatus,
        transaction::{BookTransaction, NewReservation, TransactionDetails, TransactionFilter},
    },
    repository::Repository,
    services::notifications::NotificationsService,
};

#[derive(Clone)]
pub struct TransactionsService {
    repository: Repository,
    notifications: NotificationsService,
    config: LendingConfig,
}

impl TransactionsService {
    pub fn new(repository: Repository, notifications: NotificationsService, config: LendingConfig) -> Self {
        Self {
            repository,
            notifications,
            config,
        }
    }

    /// Reserve an available book for a patron
    pub async fn reserve(&self, book_id: i32, patron_id: i32) -> AppResult<BookTransaction> {
        let book = self.repository.books.get_by_id(book_id).await?;
        if book.availability_status != AvailabilityStatus::Available {
            return Err(AppError::Unavailable(format!(
                "Book '{}' is not available (currently {})",
                book.title, book.availability_status
            )));
        }

        let reservation = NewReservation::new(book_id, patron_id, Utc::now(), self.config.loan_days);
        let transaction = self.repository.transactions.create_reservation(&reservation).await?;

        tracing::info!(
            transaction_id = transaction.id,
            book_id,
            patron_id,
            "Book reserved"
        );

        let message = format!(
            "Your reservation of '{}' is ready. Please pick it up before {}.",
            book.title,
            transaction.due_date.format("%Y-%m-%d")
        );
        if let Err(e) = self.notifications.notify(patron_id, &message).await {
            tracing::warn!(transaction_id = transaction.id, "Failed to notify patron: {}", e);
        }

        Ok(transaction)
    }

    /// Hand a reserved book to its patron
    pub async fn check_out(&self, transaction_id: i32) -> AppResult<BookTransaction> {
        let mut transaction = self.repository.transactions.get_by_id(transaction_id).await?;
        transaction.check_out(Utc::now(), self.config.loan_days)?;
        self.repository.transactions.save(&transaction).await?;

        tracing::info!(transaction_id, book_id = transaction.book_id, "Book checked out");
        Ok(transaction)
    }

    /// Take a borrowed book back
    pub async fn accept_return(&self, transaction_id: i32) -> AppResult<BookTransaction> {
        let mut transaction = self.repository.transactions.get_by_id(transaction_id).await?;
        transaction.accept_return()?;
        self.repository.transactions.save(&transaction).await?;

        tracing::info!(transaction_id, book_id = transaction.book_id, "Book returned");
        Ok(transaction)
    }

    pub async fn get(&self, transaction_id: i32) -> AppResult<BookTransaction> {
        self.repository.transactions.get_by_id(transaction_id).await
    }

    pub async fn find_transactions(&self, filter: &TransactionFilter) -> AppResult<Vec<TransactionDetails>> {
        self.repository.transactions.search(filter).await
    }

    pub async fn patron_transactions(&self, patron_id: i32) -> AppResult<Vec<TransactionDetails>> {
        self.repository.transactions.for_patron(patron_id).await
    }

    /// Borrowed, unreturned transactions past their due date at `now`
    pub async fn find_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<BookTransaction>> {
        let transactions = self.repository.transactions.list_all().await?;
        Ok(transactions.into_iter().filter(|t| t.is_overdue(now)).collect())
    }

    /// Delete a transaction; an active one gives its book back
    pub async fn delete(&self, transaction_id: i32) -> AppResult<()> {
        let transaction = self.repository.transactions.get_by_id(transaction_id).await?;
        self.repository.transactions.delete(&transaction).await?;

        tracing::info!(transaction_id, was_active = transaction.is_active(), "Transaction deleted");
        Ok(())
    }
}
