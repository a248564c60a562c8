// libs/auth-cell/src/handlers.rs
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::error::AppError;
use shared_utils::extractor::ValidJson;

use crate::models::{LoginRequest, LoginResponse, SignupRequest};
use crate::services::AccountService;

pub async fn signup(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    debug!("Signup request for {}", request.username);

    let service = AccountService::new(&state.repos);
    let outcome = service.register(request).await?;

    let mut body = json!({
        "message": "User created successfully",
        "user_id": outcome.account.id,
        "username": outcome.account.username,
        "role": outcome.account.role,
    });
    if let Some(id) = outcome.patient_id() {
        body["patient_id"] = json!(id);
    }
    if let Some(id) = outcome.doctor_id() {
        body["doctor_id"] = json!(id);
    }

    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = AccountService::new(&state.repos);
    let response = service.login(request, &state.config).await?;
    Ok(Json(response))
}
