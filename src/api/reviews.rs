//! Book review endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::review::{CreateReview, Review, UpdateReview},
    AppState,
};

use super::AuthenticatedUser;

/// Reviews of a book
#[utoipa::path(
    get,
    path = "/books/{id}/reviews",
    tag = "reviews",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Reviews", body = Vec<Review>),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_book_reviews(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.services.reviews.for_book(book_id).await?;
    Ok(Json(reviews))
}

/// Review a book
#[utoipa::path(
    post,
    path = "/books/{id}/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review added", body = Review),
        (status = 409, description = "Already reviewed", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
    Json(review): Json<CreateReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    claims.require_patron()?;
    review.validate()?;

    let created = state
        .services
        .reviews
        .add(book_id, claims.user_id, &review)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Edit own review
#[utoipa::path(
    put,
    path = "/reviews/{id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Review ID")
    ),
    request_body = UpdateReview,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 403, description = "Not your review")
    )
)]
pub async fn update_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(review): Json<UpdateReview>,
) -> AppResult<Json<Review>> {
    claims.require_patron()?;
    review.validate()?;

    let updated = state.services.reviews.update(claims.user_id, id, &review).await?;
    Ok(Json(updated))
}

/// Delete a review (own, or any for staff)
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Review ID")
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Not your review")
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state
        .services
        .reviews
        .delete(claims.user_id, claims.is_staff(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
