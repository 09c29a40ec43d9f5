//! Book review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub username: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReview {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(max = 4000, message = "Comment is too long"))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateReview {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i16>,
    #[validate(length(max = 4000, message = "Comment is too long"))]
    pub comment: Option<String>,
}

/// Mean rating, `None` when there are no reviews
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: i64 = reviews.iter().map(|r| r.rating as i64).sum();
    Some(total as f64 / reviews.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i16) -> Review {
        Review {
            id: rating as i32,
            book_id: 1,
            user_id: rating as i32,
            username: format!("reader{}", rating),
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn average_of_ratings() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[review(4), review(5), review(3)]), Some(4.0));
        assert_eq!(average_rating(&[review(1), review(2)]), Some(1.5));
    }

    #[test]
    fn rating_out_of_range_rejected() {
        let request = CreateReview { rating: 6, comment: None };
        assert!(request.validate().is_err());
        let request = CreateReview { rating: 0, comment: None };
        assert!(request.validate().is_err());
        let request = CreateReview { rating: 5, comment: Some("Loved it".into()) };
        assert!(request.validate().is_ok());
    }
}
