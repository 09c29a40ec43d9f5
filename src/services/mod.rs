//! Business logic services

pub mod authors;
pub mod books;
pub mod email;
pub mod genres;
pub mod notifications;
pub mod reading_lists;
pub mod reviews;
pub mod transactions;
pub mod users;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub authors: authors::AuthorsService,
    pub genres: genres::GenresService,
    pub users: users::UsersService,
    pub transactions: transactions::TransactionsService,
    pub reading_lists: reading_lists::ReadingListsService,
    pub reviews: reviews::ReviewsService,
    pub notifications: notifications::NotificationsService,
    pub validation: validation::ValidationService,
    pub email: email::EmailService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let email = email::EmailService::new(config.email.clone());
        let validation = validation::ValidationService::new(repository.clone());
        let notifications =
            notifications::NotificationsService::new(repository.clone(), Arc::new(email.clone()));

        Self {
            books: books::BooksService::new(repository.clone()),
            authors: authors::AuthorsService::new(repository.clone()),
            genres: genres::GenresService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), validation.clone(), config.auth.clone()),
            transactions: transactions::TransactionsService::new(
                repository.clone(),
                notifications.clone(),
                config.lending.clone(),
            ),
            reading_lists: reading_lists::ReadingListsService::new(repository.clone()),
            reviews: reviews::ReviewsService::new(repository.clone()),
            notifications,
            validation,
            email,
            repository,
        }
    }
}
