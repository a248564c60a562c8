// libs/admin-cell/src/handlers.rs
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use auth_cell::{SignupOutcome, SignupRequest};
use patient_cell::FeedbackService;
use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::clinic::{Account, Feedback};
use shared_models::error::AppError;
use shared_utils::extractor::{require_role, ValidJson, ValidPath};

use crate::models::{AdminStats, UpdateUserRequest};
use crate::services::{ReportingService, UserAdminService};

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<AdminStats>, AppError> {
    require_role(&user, &[Role::Admin])?;
    let stats = ReportingService::new(&state.repos).stats().await?;
    Ok(Json(stats))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Account>>, AppError> {
    require_role(&user, &[Role::Admin])?;
    let users = UserAdminService::new(&state.repos).list_users().await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidJson(request): ValidJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupOutcome>), AppError> {
    require_role(&user, &[Role::Admin])?;
    let outcome = UserAdminService::new(&state.repos).create_user(request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidPath(user_id): ValidPath<Uuid>,
    ValidJson(request): ValidJson<UpdateUserRequest>,
) -> Result<Json<Account>, AppError> {
    require_role(&user, &[Role::Admin])?;
    let account = UserAdminService::new(&state.repos).update_user(user_id, request).await?;
    Ok(Json(account))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidPath(user_id): ValidPath<Uuid>,
) -> Result<StatusCode, AppError> {
    require_role(&user, &[Role::Admin])?;
    UserAdminService::new(&state.repos).delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_feedback(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Feedback>>, AppError> {
    require_role(&user, &[Role::Admin])?;
    let feedback = FeedbackService::new(&state.repos).list().await?;
    Ok(Json(feedback))
}
