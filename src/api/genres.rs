//! Genre endpoints

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
        genre::{GenrePayload, GenreQuery, PatchGenre},
        Genre,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Paginated genres response
#[derive(Serialize, ToSchema)]
pub struct GenresListResponse {
    pub genres: Vec<Genre>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// List genres, ordered by name
#[utoipa::path(
    get,
    path = "/genres",
    tag = "genres",
    params(GenreQuery),
    responses(
        (status = 200, description = "Genres list", body = GenresListResponse)
    )
)]
pub async fn list_genres(
    State(state): State<AppState>,
    Query(query): Query<GenreQuery>,
) -> AppResult<Json<GenresListResponse>> {
    let page = query.page();
    let (genres, total) = state.services.catalog.list_genres(&query).await?;
    Ok(Json(GenresListResponse {
        genres,
        total,
        page: page.number(),
        per_page: page.size(),
    }))
}

/// Get genre by ID
#[utoipa::path(
    get,
    path = "/genres/{id}",
    tag = "genres",
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre details", body = Genre),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.services.catalog.get_genre(id).await?))
}

/// Create a genre
#[utoipa::path(
    post,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = GenrePayload,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<GenrePayload>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    let genre = state.services.catalog.create_genre(data).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// Replace a genre
#[utoipa::path(
    put,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = GenrePayload,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<GenrePayload>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.services.catalog.update_genre(id, data).await?))
}

/// Partially update a genre
#[utoipa::path(
    patch,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = PatchGenre,
    responses(
        (status = 200, description = "Genre updated", body = Genre)
    )
)]
pub async fn patch_genre(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(patch): Json<PatchGenre>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.services.catalog.patch_genre(id, patch).await?))
}

/// Delete a genre; its book links are removed
#[utoipa::path(
    delete,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted")
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
