// libs/patient-cell/src/handlers.rs
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::clinic::{MedicalRecord, PatientDetails};
use shared_models::error::AppError;
use shared_utils::extractor::{require_role, ValidJson, ValidQuery};

use crate::models::{CreateRecordRequest, FeedbackRequest, RecordQuery};
use crate::services::{FeedbackService, MedicalRecordService, PatientService};

pub async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientDetails>>, AppError> {
    let patients = PatientService::new(&state.repos).list_patients().await?;
    Ok(Json(patients))
}

pub async fn list_medical_records(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<RecordQuery>,
) -> Result<Json<Vec<MedicalRecord>>, AppError> {
    let records = MedicalRecordService::new(&state.repos)
        .list_records(query.patient_id)
        .await?;
    Ok(Json(records))
}

pub async fn create_medical_record(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidJson(request): ValidJson<CreateRecordRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let record = MedicalRecordService::new(&state.repos)
        .create_record(&user, request)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Medical record added",
        "record": record
    }))))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<FeedbackRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let feedback = FeedbackService::new(&state.repos).submit(request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Feedback submitted",
        "feedback": feedback
    }))))
}
