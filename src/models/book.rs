//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{author::AuthorRef, enums::AvailabilityStatus, genre::Genre, pagination::Pagination, review::Review};

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub genre_id: Option<i32>,
    pub availability_status: AvailabilityStatus,
    pub created_at: DateTime<Utc>,
}

/// Short book representation for search results
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub genre_id: Option<i32>,
    pub genre_name: Option<String>,
    pub availability_status: AvailabilityStatus,
    /// "First Last" display names
    pub authors: Vec<String>,
}

/// Full book view with authors, genre and reviews
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub authors: Vec<AuthorRef>,
    pub genre: Option<Genre>,
    pub reviews: Vec<Review>,
    pub average_rating: Option<f64>,
}

/// Book search parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Substring of the title
    pub title: Option<String>,
    /// Substring of an author's first or last name
    pub author: Option<String>,
    pub genre_id: Option<i32>,
    pub isbn: Option<String>,
    pub status: Option<AvailabilityStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }

    pub fn page(&self) -> i64 {
        self.pagination().page
    }

    pub fn per_page(&self) -> i64 {
        self.pagination().per_page
    }

    pub fn offset(&self) -> i64 {
        self.pagination().offset()
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    #[validate(range(min = 0, max = 9999, message = "Invalid publication year"))]
    pub publication_year: Option<i32>,
    pub genre_id: Option<i32>,
    #[serde(default)]
    pub author_ids: Vec<i32>,
}

/// Update book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    #[validate(range(min = 0, max = 9999, message = "Invalid publication year"))]
    pub publication_year: Option<i32>,
    pub genre_id: Option<i32>,
    /// Replaces the author list when present
    pub author_ids: Option<Vec<i32>>,
}

/// Manual availability change (librarian)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAvailability {
    pub status: AvailabilityStatus,
}
