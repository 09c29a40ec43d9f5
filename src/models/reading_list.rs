//! Reading list model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReadingList {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadingListDetails {
    #[serde(flatten)]
    pub list: ReadingList,
    pub books: Vec<BookSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SaveReadingList {
    #[validate(length(min = 1, max = 100, message = "List name must be 1 to 100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddBookToList {
    pub book_id: i32,
}
