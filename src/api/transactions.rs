//! Lending endpoints: reserve, check out, return

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::transaction::{BookTransaction, ReserveRequest, TransactionDetails, TransactionFilter},
    AppState,
};

use super::AuthenticatedUser;

/// Reserve an available book
#[utoipa::path(
    post,
    path = "/transactions/reserve",
    tag = "transactions",
    security(("bearer_auth" = [])),
    request_body = ReserveRequest,
    responses(
        (status = 201, description = "Book reserved", body = BookTransaction),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn reserve(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ReserveRequest>,
) -> AppResult<(StatusCode, Json<BookTransaction>)> {
    claims.require_patron()?;

    let transaction = state
        .services
        .transactions
        .reserve(request.book_id, claims.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Hand a reserved book to the patron
#[utoipa::path(
    post,
    path = "/transactions/{id}/checkout",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Book checked out", body = BookTransaction),
        (status = 409, description = "Transaction is not a pending reservation", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_out(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookTransaction>> {
    claims.require_librarian()?;

    let transaction = state.services.transactions.check_out(id).await?;
    Ok(Json(transaction))
}

/// Accept a borrowed book back
#[utoipa::path(
    post,
    path = "/transactions/{id}/return",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = BookTransaction),
        (status = 409, description = "Transaction is not an open loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn accept_return(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookTransaction>> {
    claims.require_librarian()?;

    let transaction = state.services.transactions.accept_return(id).await?;
    Ok(Json(transaction))
}

/// Search transactions
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(TransactionFilter),
    responses(
        (status = 200, description = "Matching transactions", body = Vec<TransactionDetails>)
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(filter): Query<TransactionFilter>,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    claims.require_librarian()?;

    let transactions = state.services.transactions.find_transactions(&filter).await?;
    Ok(Json(transactions))
}

/// Loans past their due date
#[utoipa::path(
    get,
    path = "/transactions/overdue",
    tag = "transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue loans", body = Vec<BookTransaction>)
    )
)]
pub async fn overdue_transactions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookTransaction>>> {
    claims.require_librarian()?;

    let overdue = state.services.transactions.find_overdue(Utc::now()).await?;
    Ok(Json(overdue))
}

/// The current patron's transactions
#[utoipa::path(
    get,
    path = "/transactions/mine",
    tag = "transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own transactions", body = Vec<TransactionDetails>)
    )
)]
pub async fn my_transactions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    claims.require_patron()?;

    let transactions = state
        .services
        .transactions
        .patron_transactions(claims.user_id)
        .await?;
    Ok(Json(transactions))
}

/// Get a transaction
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction", body = BookTransaction),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookTransaction>> {
    claims.require_librarian()?;

    let transaction = state.services.transactions.get(id).await?;
    Ok(Json(transaction))
}

/// Delete a transaction, releasing its book if still active
#[utoipa::path(
    delete,
    path = "/transactions/{id}",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_librarian()?;

    state.services.transactions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
