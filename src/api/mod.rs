//! API handlers for Bibliotheca REST endpoints

pub mod account;
pub mod admin;
pub mod authors;
pub mod books;
pub mod genres;
pub mod health;
pub mod notifications;
pub mod openapi;
pub mod reading_lists;
pub mod reviews;
pub mod transactions;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Account
        .route("/account/register", post(account::register))
        .route("/account/login", post(account::login))
        .route("/account/me", get(account::me))
        .route("/account/profile", put(account::update_profile))
        // Books
        .route("/books", post(books::create_book))
        .route("/books/search", get(books::search_books))
        .route("/books/recommendations", get(books::recommendations))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/books/:id/availability", put(books::set_availability))
        .route(
            "/books/:id/reviews",
            get(reviews::list_book_reviews).post(reviews::add_review),
        )
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Genres
        .route("/genres", get(genres::list_genres).post(genres::create_genre))
        .route(
            "/genres/:id",
            get(genres::get_genre)
                .put(genres::update_genre)
                .delete(genres::delete_genre),
        )
        // Transactions
        .route("/transactions", get(transactions::list_transactions))
        .route("/transactions/reserve", post(transactions::reserve))
        .route("/transactions/mine", get(transactions::my_transactions))
        .route("/transactions/overdue", get(transactions::overdue_transactions))
        .route(
            "/transactions/:id",
            get(transactions::get_transaction).delete(transactions::delete_transaction),
        )
        .route("/transactions/:id/checkout", post(transactions::check_out))
        .route("/transactions/:id/return", post(transactions::accept_return))
        // Reading lists
        .route(
            "/reading-lists",
            get(reading_lists::list_reading_lists).post(reading_lists::create_reading_list),
        )
        .route(
            "/reading-lists/:id",
            get(reading_lists::get_reading_list)
                .put(reading_lists::rename_reading_list)
                .delete(reading_lists::delete_reading_list),
        )
        .route("/reading-lists/:id/books", post(reading_lists::add_book))
        .route(
            "/reading-lists/:id/books/:book_id",
            axum::routing::delete(reading_lists::remove_book),
        )
        // Reviews
        .route(
            "/reviews/:id",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/:id/read", post(notifications::mark_read))
        // Administration
        .route("/admin/users", get(admin::list_users))
        .route(
            "/admin/users/:id",
            get(admin::get_user).delete(admin::delete_user),
        )
        .route("/admin/users/:id/role", put(admin::assign_role))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
