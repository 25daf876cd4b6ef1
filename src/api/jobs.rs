//! Background job endpoints (staff only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    services::jobs::{Job, JobReport},
    AppState,
};

use super::AuthenticatedUser;

/// Queue a job; returns immediately with its report
#[utoipa::path(
    post,
    path = "/jobs",
    tag = "jobs",
    security(("bearer_auth" = [])),
    request_body = Job,
    responses(
        (status = 202, description = "Job queued", body = JobReport),
        (status = 403, description = "Staff access required"),
        (status = 503, description = "Queue full", body = crate::error::ErrorResponse)
    )
)]
pub async fn submit_job(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(job): Json<Job>,
) -> AppResult<(StatusCode, Json<JobReport>)> {
    claims.require_staff()?;
    let report = state.services.jobs.submit(job).await?;
    Ok((StatusCode::ACCEPTED, Json(report)))
}

#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "jobs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job report", body = JobReport),
        (status = 404, description = "Unknown job")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JobReport>> {
    claims.require_staff()?;
    Ok(Json(state.services.jobs.report(id).await?))
}
