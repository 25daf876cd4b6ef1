//! Author endpoints

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
        author::{AuthorPayload, AuthorQuery, PatchAuthor},
        Author,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Paginated authors response
#[derive(Serialize, ToSchema)]
pub struct AuthorsListResponse {
    pub authors: Vec<Author>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// List authors, ordered by last name then first name
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(AuthorQuery),
    responses(
        (status = 200, description = "Authors list", body = AuthorsListResponse)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<AuthorQuery>,
) -> AppResult<Json<AuthorsListResponse>> {
    let page = query.page();
    let (authors, total) = state.services.catalog.list_authors(&query).await?;
    Ok(Json(AuthorsListResponse {
        authors,
        total,
        page: page.number(),
        per_page: page.size(),
    }))
}

/// Get author by ID
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Author>> {
    Ok(Json(state.services.catalog.get_author(id).await?))
}

/// Create an author
///
/// Dates must not lie in the future, death must not precede birth, and
/// (first_name, last_name) must be unique.
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorPayload,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<AuthorPayload>,
) -> AppResult<(StatusCode, Json<Author>)> {
    let author = state.services.catalog.create_author(data).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Replace an author
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = AuthorPayload,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<AuthorPayload>,
) -> AppResult<Json<Author>> {
    Ok(Json(state.services.catalog.update_author(id, data).await?))
}

/// Partially update an author
#[utoipa::path(
    patch,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = PatchAuthor,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn patch_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(patch): Json<PatchAuthor>,
) -> AppResult<Json<Author>> {
    Ok(Json(state.services.catalog.patch_author(id, patch).await?))
}

/// Delete an author; their books are kept without an author
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
