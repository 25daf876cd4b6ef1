//! Book instance (copy) endpoints

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
        book_instance::{BookInstancePayload, BookInstanceQuery, PatchBookInstance},
        BookInstance,
    },
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct BookInstancesListResponse {
    pub book_instances: Vec<BookInstance>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// List copies ordered by book title, latest due date first
#[utoipa::path(
    get,
    path = "/book-instances",
    tag = "book-instances",
    params(BookInstanceQuery),
    responses(
        (status = 200, description = "Book instances list", body = BookInstancesListResponse)
    )
)]
pub async fn list_book_instances(
    State(state): State<AppState>,
    Query(query): Query<BookInstanceQuery>,
) -> AppResult<Json<BookInstancesListResponse>> {
    let page = query.page();
    let (book_instances, total) = state.services.catalog.list_book_instances(&query).await?;
    Ok(Json(BookInstancesListResponse {
        book_instances,
        total,
        page: page.number(),
        per_page: page.size(),
    }))
}

#[utoipa::path(
    get,
    path = "/book-instances/{id}",
    tag = "book-instances",
    params(("id" = i32, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Book instance details", body = BookInstance),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_book_instance(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookInstance>> {
    Ok(Json(state.services.catalog.get_book_instance(id).await?))
}

#[utoipa::path(
    post,
    path = "/book-instances",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    request_body = BookInstancePayload,
    responses(
        (status = 201, description = "Book instance created", body = BookInstance),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<BookInstancePayload>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    let copy = state.services.catalog.create_book_instance(data).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

#[utoipa::path(
    put,
    path = "/book-instances/{id}",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book instance ID")),
    request_body = BookInstancePayload,
    responses(
        (status = 200, description = "Book instance updated", body = BookInstance)
    )
)]
pub async fn update_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<BookInstancePayload>,
) -> AppResult<Json<BookInstance>> {
    Ok(Json(
        state.services.catalog.update_book_instance(id, data).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/book-instances/{id}",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book instance ID")),
    request_body = PatchBookInstance,
    responses(
        (status = 200, description = "Book instance updated", body = BookInstance)
    )
)]
pub async fn patch_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(patch): Json<PatchBookInstance>,
) -> AppResult<Json<BookInstance>> {
    Ok(Json(
        state.services.catalog.patch_book_instance(id, patch).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/book-instances/{id}",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book instance ID")),
    responses(
        (status = 204, description = "Book instance deleted")
    )
)]
pub async fn delete_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
