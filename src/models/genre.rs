//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

/// Genre with the number of books filed under it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenreDetails {
    #[serde(flatten)]
    pub genre: Genre,
    pub book_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGenre {
    #[validate(length(min = 1, max = 100, message = "Genre name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateGenre {
    #[validate(length(min = 1, max = 100, message = "Genre name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
}
