//! Language endpoints

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
        language::{LanguagePayload, LanguageQuery, PatchLanguage},
        Language,
    },
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct LanguagesListResponse {
    pub languages: Vec<Language>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[utoipa::path(
    get,
    path = "/languages",
    tag = "languages",
    params(LanguageQuery),
    responses(
        (status = 200, description = "Languages list", body = LanguagesListResponse)
    )
)]
pub async fn list_languages(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> AppResult<Json<LanguagesListResponse>> {
    let page = query.page();
    let (languages, total) = state.services.catalog.list_languages(&query).await?;
    Ok(Json(LanguagesListResponse {
        languages,
        total,
        page: page.number(),
        per_page: page.size(),
    }))
}

#[utoipa::path(
    get,
    path = "/languages/{id}",
    tag = "languages",
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 200, description = "Language details", body = Language),
        (status = 404, description = "Language not found")
    )
)]
pub async fn get_language(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Language>> {
    Ok(Json(state.services.catalog.get_language(id).await?))
}

#[utoipa::path(
    post,
    path = "/languages",
    tag = "languages",
    security(("bearer_auth" = [])),
    request_body = LanguagePayload,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(data): Json<LanguagePayload>,
) -> AppResult<(StatusCode, Json<Language>)> {
    let language = state.services.catalog.create_language(data).await?;
    Ok((StatusCode::CREATED, Json(language)))
}

#[utoipa::path(
    put,
    path = "/languages/{id}",
    tag = "languages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    request_body = LanguagePayload,
    responses(
        (status = 200, description = "Language updated", body = Language)
    )
)]
pub async fn update_language(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<LanguagePayload>,
) -> AppResult<Json<Language>> {
    Ok(Json(state.services.catalog.update_language(id, data).await?))
}

#[utoipa::path(
    patch,
    path = "/languages/{id}",
    tag = "languages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    request_body = PatchLanguage,
    responses(
        (status = 200, description = "Language updated", body = Language)
    )
)]
pub async fn patch_language(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(patch): Json<PatchLanguage>,
) -> AppResult<Json<Language>> {
    Ok(Json(state.services.catalog.patch_language(id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/languages/{id}",
    tag = "languages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 204, description = "Language deleted")
    )
)]
pub async fn delete_language(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_language(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
