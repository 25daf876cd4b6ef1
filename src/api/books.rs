//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        book::{BookPayload, BookQuery, PatchBook},
        Book,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Paginated books response
#[derive(Serialize, ToSchema)]
pub struct BooksListResponse {
    pub books: Vec<Book>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Books list", body = BooksListResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BooksListResponse>> {
    let page = query.page();
    let (books, total) = state.services.catalog.list_books(&query).await?;
    Ok(Json(BooksListResponse {
        books,
        total,
        page: page.number(),
        per_page: page.size(),
    }))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Book>> {
    Ok(Json(state.services.catalog.get_book(id).await?))
}

/// Create a book
///
/// `copies` must equal `loaned_copies + available_copies`, `published` must
/// not follow `date_added`, and (title, author) must be unique.
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<BookPayload>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.catalog.create_book(data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<BookPayload>,
) -> AppResult<Json<Book>> {
    Ok(Json(state.services.catalog.update_book(id, data).await?))
}

#[utoipa::path(
    patch,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = PatchBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn patch_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(patch): Json<PatchBook>,
) -> AppResult<Json<Book>> {
    Ok(Json(state.services.catalog.patch_book(id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
