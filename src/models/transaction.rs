//! Book transaction (lending event) model and lifecycle rules

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::TransactionType;
use crate::error::{AppError, AppResult};

/// Lending event from database.
///
/// Moves `Reserved -> Borrowed -> Returned` and never back. `is_returned`
/// is set only together with the `Returned` type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookTransaction {
    pub id: i32,
    pub book_id: i32,
    pub patron_id: i32,
    pub transaction_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub transaction_type: TransactionType,
    pub is_returned: bool,
}

impl BookTransaction {
    /// Reserved -> Borrowed. Dates restart from `now`.
    pub fn check_out(&mut self, now: DateTime<Utc>, loan_days: i64) -> AppResult<()> {
        if self.is_returned {
            return Err(AppError::InvalidState(format!(
                "Transaction {} has already been returned",
                self.id
            )));
        }
        if self.transaction_type != TransactionType::Reserved {
            return Err(AppError::InvalidState(format!(
                "Transaction {} is {}, only reserved transactions can be checked out",
                self.id, self.transaction_type
            )));
        }

        self.transaction_type = TransactionType::Borrowed;
        self.transaction_date = now;
        self.due_date = now + Duration::days(loan_days);
        Ok(())
    }

    /// Borrowed -> Returned
    pub fn accept_return(&mut self) -> AppResult<()> {
        if self.is_returned {
            return Err(AppError::InvalidState(format!(
                "Transaction {} has already been returned",
                self.id
            )));
        }
        if self.transaction_type != TransactionType::Borrowed {
            return Err(AppError::InvalidState(format!(
                "Transaction {} is {}, only borrowed transactions can be returned",
                self.id, self.transaction_type
            )));
        }

        self.transaction_type = TransactionType::Returned;
        self.is_returned = true;
        Ok(())
    }

    /// Still holds its book (reserved or borrowed)
    pub fn is_active(&self) -> bool {
        !self.is_returned && self.transaction_type != TransactionType::Returned
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.transaction_type == TransactionType::Borrowed && !self.is_returned && self.due_date < now
    }
}

/// Values for a freshly placed reservation
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub book_id: i32,
    pub patron_id: i32,
    pub transaction_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl NewReservation {
    pub fn new(book_id: i32, patron_id: i32, now: DateTime<Utc>, loan_days: i64) -> Self {
        Self {
            book_id,
            patron_id,
            transaction_date: now,
            due_date: now + Duration::days(loan_days),
        }
    }
}

/// Transaction joined with book title and patron name for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TransactionDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub patron_id: i32,
    pub patron_username: String,
    pub patron_name: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub transaction_type: TransactionType,
    pub is_returned: bool,
    pub is_overdue: bool,
}

/// Transaction search filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    /// Substring of username, first or last name
    pub patron_name: Option<String>,
    /// Substring of the book title
    pub book_title: Option<String>,
    pub is_returned: Option<bool>,
    /// Only borrowed, unreturned, past-due loans
    pub overdue_only: Option<bool>,
}

/// Reserve request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReserveRequest {
    pub book_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reserved(now: DateTime<Utc>) -> BookTransaction {
        BookTransaction {
            id: 7,
            book_id: 1,
            patron_id: 5,
            transaction_date: now,
            due_date: now + Duration::days(14),
            transaction_type: TransactionType::Reserved,
            is_returned: false,
        }
    }

    #[test]
    fn check_out_resets_dates() {
        let reserved_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let picked_up = Utc.with_ymd_and_hms(2024, 3, 4, 15, 30, 0).unwrap();
        let mut transaction = reserved(reserved_at);

        transaction.check_out(picked_up, 14).unwrap();

        assert_eq!(transaction.transaction_type, TransactionType::Borrowed);
        assert_eq!(transaction.transaction_date, picked_up);
        assert_eq!(transaction.due_date, picked_up + Duration::days(14));
        assert!(!transaction.is_returned);
    }

    #[test]
    fn check_out_twice_fails() {
        let now = Utc::now();
        let mut transaction = reserved(now);
        transaction.check_out(now, 14).unwrap();

        let before = transaction.clone();
        let err = transaction.check_out(now, 14).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(transaction, before);
    }

    #[test]
    fn return_requires_borrowed() {
        let mut transaction = reserved(Utc::now());
        assert!(matches!(transaction.accept_return(), Err(AppError::InvalidState(_))));
        assert!(!transaction.is_returned);
    }

    #[test]
    fn returned_is_final() {
        let now = Utc::now();
        let mut transaction = reserved(now);
        transaction.check_out(now, 14).unwrap();
        transaction.accept_return().unwrap();

        assert!(transaction.is_returned);
        assert_eq!(transaction.transaction_type, TransactionType::Returned);
        assert!(transaction.check_out(now, 14).is_err());
        assert!(transaction.accept_return().is_err());
        assert!(!transaction.is_active());
    }

    #[test]
    fn overdue_only_for_borrowed_past_due() {
        let now = Utc::now();
        let mut transaction = reserved(now - Duration::days(30));
        // reserved but past due is not a loan yet
        assert!(!transaction.is_overdue(now));

        transaction.check_out(now - Duration::days(20), 14).unwrap();
        assert!(transaction.is_overdue(now));
        assert!(!transaction.is_overdue(now - Duration::days(10)));

        transaction.accept_return().unwrap();
        assert!(!transaction.is_overdue(now));
    }

    #[test]
    fn reservation_due_in_loan_period() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let reservation = NewReservation::new(1, 5, now, 14);
        assert_eq!(reservation.due_date, Utc.with_ymd_and_hms(2024, 1, 24, 12, 0, 0).unwrap());
    }
}
