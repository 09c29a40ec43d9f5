//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    account, admin, authors, books, genres, health, notifications, reading_lists, reviews, transactions,
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bibliotheca API",
        version = "1.0.0",
        description = "Library management REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Account
        account::register,
        account::login,
        account::me,
        account::update_profile,
        // Books
        books::search_books,
        books::get_book,
        books::recommendations,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::set_availability,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Genres
        genres::list_genres,
        genres::get_genre,
        genres::create_genre,
        genres::update_genre,
        genres::delete_genre,
        // Transactions
        transactions::reserve,
        transactions::check_out,
        transactions::accept_return,
        transactions::list_transactions,
        transactions::overdue_transactions,
        transactions::my_transactions,
        transactions::get_transaction,
        transactions::delete_transaction,
        // Reading lists
        reading_lists::list_reading_lists,
        reading_lists::create_reading_list,
        reading_lists::get_reading_list,
        reading_lists::rename_reading_list,
        reading_lists::delete_reading_list,
        reading_lists::add_book,
        reading_lists::remove_book,
        // Reviews
        reviews::list_book_reviews,
        reviews::add_review,
        reviews::update_review,
        reviews::delete_review,
        // Notifications
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        // Administration
        admin::list_users,
        admin::get_user,
        admin::assign_role,
        admin::delete_user,
    ),
    components(
        schemas(
            // Enums
            crate::models::enums::Role,
            crate::models::enums::AvailabilityStatus,
            crate::models::enums::TransactionType,
            // Account
            crate::models::user::User,
            crate::models::user::RegisterUser,
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            crate::models::user::UpdateProfile,
            crate::models::user::AssignRole,
            crate::models::user::UserQuery,
            account::MeResponse,
            // Catalog
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookDetails,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::UpdateAvailability,
            crate::models::author::Author,
            crate::models::author::AuthorRef,
            crate::models::author::AuthorDetails,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::genre::Genre,
            crate::models::genre::GenreDetails,
            crate::models::genre::CreateGenre,
            crate::models::genre::UpdateGenre,
            // Lending
            crate::models::transaction::BookTransaction,
            crate::models::transaction::TransactionDetails,
            crate::models::transaction::TransactionFilter,
            crate::models::transaction::ReserveRequest,
            // Reading lists and reviews
            crate::models::reading_list::ReadingList,
            crate::models::reading_list::ReadingListDetails,
            crate::models::reading_list::SaveReadingList,
            crate::models::reading_list::AddBookToList,
            crate::models::review::Review,
            crate::models::review::CreateReview,
            crate::models::review::UpdateReview,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::UnreadCount,
            notifications::MarkedRead,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "account", description = "Registration, login and profile"),
        (name = "books", description = "Book catalog"),
        (name = "authors", description = "Authors"),
        (name = "genres", description = "Genres"),
        (name = "transactions", description = "Reservations, check-outs and returns"),
        (name = "reading-lists", description = "Patron reading lists"),
        (name = "reviews", description = "Book reviews"),
        (name = "notifications", description = "User notifications"),
        (name = "admin", description = "User administration")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
