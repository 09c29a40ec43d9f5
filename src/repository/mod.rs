//! Repository layer for database operations

pub mod authors;
pub mod books;
pub mod genres;
pub mod notifications;
pub mod reading_lists;
pub mod reviews;
pub mod transactions;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

pub use authors::AuthorsRepository;
pub use books::BooksRepository;
pub use genres::GenresRepository;
pub use notifications::NotificationsRepository;
pub use reading_lists::ReadingListsRepository;
pub use reviews::ReviewsRepository;
pub use transactions::TransactionsRepository;
pub use users::UsersRepository;

/// Main repository struct holding one store per entity type
#[derive(Clone)]
pub struct Repository {
    pub pool: Option<Pool<Postgres>>,
    pub books: Arc<dyn BooksRepository>,
    pub authors: Arc<dyn AuthorsRepository>,
    pub genres: Arc<dyn GenresRepository>,
    pub users: Arc<dyn UsersRepository>,
    pub transactions: Arc<dyn TransactionsRepository>,
    pub reading_lists: Arc<dyn ReadingListsRepository>,
    pub reviews: Arc<dyn ReviewsRepository>,
    pub notifications: Arc<dyn NotificationsRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            authors: Arc::new(authors::PgAuthorsRepository::new(pool.clone())),
            genres: Arc::new(genres::PgGenresRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool.clone())),
            transactions: Arc::new(transactions::PgTransactionsRepository::new(pool.clone())),
            reading_lists: Arc::new(reading_lists::PgReadingListsRepository::new(pool.clone())),
            reviews: Arc::new(reviews::PgReviewsRepository::new(pool.clone())),
            notifications: Arc::new(notifications::PgNotificationsRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
