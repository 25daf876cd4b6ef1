//! Authentication endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{
        user::{LoginRequest, LoginResponse},
        User,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Exchange username and password for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    Ok(Json(state.services.users.login(&request).await?))
}

/// Current user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<User>> {
    Ok(Json(state.services.users.get_by_id(claims.user_id).await?))
}
