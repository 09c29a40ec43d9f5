//! Periodic overdue-loan reminders

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::{sync::oneshot, task::JoinHandle};

use crate::{
    error::AppResult,
    repository::Repository,
    services::{notifications::NotificationsService, transactions::TransactionsService},
};

#[derive(Clone)]
pub struct OverdueSweep {
    repository: Repository,
    transactions: TransactionsService,
    notifications: NotificationsService,
}

impl OverdueSweep {
    pub fn new(
        repository: Repository,
        transactions: TransactionsService,
        notifications: NotificationsService,
    ) -> Self {
        Self {
            repository,
            transactions,
            notifications,
        }
    }

    /// Notify the patron of every loan overdue at `now`; returns the number of notifications sent.
    ///
    /// Runs are independent: a loan still overdue next time is reported again.
    pub async fn run_once(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let overdue = self.transactions.find_overdue(now).await?;
        let mut sent = 0;

        for transaction in &overdue {
            let title = match self.repository.books.get_by_id(transaction.book_id).await {
                Ok(book) => book.title,
                Err(e) => {
                    tracing::warn!(transaction_id = transaction.id, "Skipping overdue loan: {}", e);
                    continue;
                }
            };
            let message = format!(
                "The book '{}' was due on {}. Please return it.",
                title,
                transaction.due_date.format("%Y-%m-%d")
            );

            match self.notifications.notify(transaction.patron_id, &message).await {
                Ok(_) => sent += 1,
                Err(e) => tracing::warn!(
                    transaction_id = transaction.id,
                    patron_id = transaction.patron_id,
                    "Failed to send overdue notification: {}",
                    e
                ),
            }
        }

        tracing::info!(overdue = overdue.len(), sent, "Overdue sweep finished");
        Ok(sent)
    }

    /// Run the sweep now and then every `period` until `shutdown` fires
    pub fn spawn(self, period: Duration, mut shutdown: oneshot::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = &mut shutdown => {
                        tracing::info!("Overdue sweep stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once(Utc::now()).await {
                            tracing::error!("Overdue sweep failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}
