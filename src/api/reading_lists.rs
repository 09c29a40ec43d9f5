//! Reading list endpoints (patrons, own lists only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::reading_list::{AddBookToList, ReadingList, ReadingListDetails, SaveReadingList},
    AppState,
};

use super::AuthenticatedUser;

/// List own reading lists
#[utoipa::path(
    get,
    path = "/reading-lists",
    tag = "reading-lists",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reading lists", body = Vec<ReadingList>)
    )
)]
pub async fn list_reading_lists(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ReadingList>>> {
    claims.require_patron()?;

    let lists = state.services.reading_lists.list(claims.user_id).await?;
    Ok(Json(lists))
}

/// Create a reading list
#[utoipa::path(
    post,
    path = "/reading-lists",
    tag = "reading-lists",
    security(("bearer_auth" = [])),
    request_body = SaveReadingList,
    responses(
        (status = 201, description = "Reading list created", body = ReadingList)
    )
)]
pub async fn create_reading_list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<SaveReadingList>,
) -> AppResult<(StatusCode, Json<ReadingList>)> {
    claims.require_patron()?;
    request.validate()?;

    let list = state
        .services
        .reading_lists
        .create(claims.user_id, &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// Get a reading list with its books
#[utoipa::path(
    get,
    path = "/reading-lists/{id}",
    tag = "reading-lists",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reading list ID")
    ),
    responses(
        (status = 200, description = "Reading list", body = ReadingListDetails),
        (status = 403, description = "Not your list")
    )
)]
pub async fn get_reading_list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ReadingListDetails>> {
    claims.require_patron()?;

    let list = state.services.reading_lists.get(claims.user_id, id).await?;
    Ok(Json(list))
}

/// Rename a reading list
#[utoipa::path(
    put,
    path = "/reading-lists/{id}",
    tag = "reading-lists",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reading list ID")
    ),
    request_body = SaveReadingList,
    responses(
        (status = 200, description = "Reading list renamed", body = ReadingList)
    )
)]
pub async fn rename_reading_list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<SaveReadingList>,
) -> AppResult<Json<ReadingList>> {
    claims.require_patron()?;
    request.validate()?;

    let list = state
        .services
        .reading_lists
        .rename(claims.user_id, id, &request.name)
        .await?;
    Ok(Json(list))
}

/// Delete a reading list
#[utoipa::path(
    delete,
    path = "/reading-lists/{id}",
    tag = "reading-lists",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reading list ID")
    ),
    responses(
        (status = 204, description = "Reading list deleted")
    )
)]
pub async fn delete_reading_list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_patron()?;

    state.services.reading_lists.delete(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a book to a reading list
#[utoipa::path(
    post,
    path = "/reading-lists/{id}/books",
    tag = "reading-lists",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reading list ID")
    ),
    request_body = AddBookToList,
    responses(
        (status = 200, description = "Book added", body = ReadingListDetails),
        (status = 409, description = "Book already in the list", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<AddBookToList>,
) -> AppResult<Json<ReadingListDetails>> {
    claims.require_patron()?;

    let list = state
        .services
        .reading_lists
        .add_book(claims.user_id, id, request.book_id)
        .await?;
    Ok(Json(list))
}

/// Remove a book from a reading list
#[utoipa::path(
    delete,
    path = "/reading-lists/{id}/books/{book_id}",
    tag = "reading-lists",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reading list ID"),
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book removed"),
        (status = 404, description = "Book not in the list", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, book_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    claims.require_patron()?;

    state
        .services
        .reading_lists
        .remove_book(claims.user_id, id, book_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
