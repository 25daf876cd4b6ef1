//! User, group and profile administration endpoints (staff only)

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
        user::{CreateGroup, CreateUser, UpdateProfile, UpdateUser, UserQuery},
        Group, Page, Profile, User,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Paginated users response
#[derive(Serialize, ToSchema)]
pub struct UsersListResponse {
    pub users: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Serialize, ToSchema)]
pub struct GroupsListResponse {
    pub groups: Vec<Group>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ProfilesListResponse {
    pub profiles: Vec<Profile>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Users list", body = UsersListResponse),
        (status = 403, description = "Staff access required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<UsersListResponse>> {
    claims.require_staff()?;
    let page = query.page();
    let (users, total) = state.services.users.list(&query).await?;
    Ok(Json(UsersListResponse {
        users,
        total,
        page: page.number(),
        per_page: page.size(),
    }))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    claims.require_staff()?;
    Ok(Json(state.services.users.get_by_id(id).await?))
}

/// Create a user (and their empty profile)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_staff()?;
    let user = state.services.users.create_user(data).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    claims.require_staff()?;
    Ok(Json(state.services.users.update_user(id, data).await?))
}

/// Delete a user; their borrowed copies are detached
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/groups",
    tag = "users",
    security(("bearer_auth" = [])),
    params(Page),
    responses(
        (status = 200, description = "Groups list", body = GroupsListResponse)
    )
)]
pub async fn list_groups(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(page): Query<Page>,
) -> AppResult<Json<GroupsListResponse>> {
    claims.require_staff()?;
    let (groups, total) = state.services.users.list_groups(&page).await?;
    Ok(Json(GroupsListResponse {
        groups,
        total,
        page: page.number(),
        per_page: page.size(),
    }))
}

#[utoipa::path(
    get,
    path = "/groups/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group details", body = Group)
    )
)]
pub async fn get_group(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Group>> {
    claims.require_staff()?;
    Ok(Json(state.services.users.get_group(id).await?))
}

#[utoipa::path(
    post,
    path = "/groups",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateGroup,
    responses(
        (status = 201, description = "Group created", body = Group)
    )
)]
pub async fn create_group(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateGroup>,
) -> AppResult<(StatusCode, Json<Group>)> {
    claims.require_staff()?;
    let group = state.services.users.create_group(data).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    delete,
    path = "/groups/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Group ID")),
    responses(
        (status = 204, description = "Group deleted")
    )
)]
pub async fn delete_group(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.users.delete_group(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/profiles",
    tag = "users",
    security(("bearer_auth" = [])),
    params(Page),
    responses(
        (status = 200, description = "Profiles list", body = ProfilesListResponse)
    )
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(page): Query<Page>,
) -> AppResult<Json<ProfilesListResponse>> {
    claims.require_staff()?;
    let (profiles, total) = state.services.users.list_profiles(&page).await?;
    Ok(Json(ProfilesListResponse {
        profiles,
        total,
        page: page.number(),
        per_page: page.size(),
    }))
}

#[utoipa::path(
    get,
    path = "/profiles/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile details", body = Profile)
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Profile>> {
    claims.require_staff()?;
    Ok(Json(state.services.users.get_profile(id).await?))
}

#[utoipa::path(
    put,
    path = "/profiles/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Profile ID")),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = Profile)
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateProfile>,
) -> AppResult<Json<Profile>> {
    claims.require_staff()?;
    Ok(Json(state.services.users.update_profile(id, data).await?))
}
