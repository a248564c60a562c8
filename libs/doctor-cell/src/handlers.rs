// libs/doctor-cell/src/handlers.rs
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::clinic::{DoctorDetails, PatientDetails};
use shared_models::error::AppError;
use shared_utils::extractor::{require_role, ValidJson, ValidPath, ValidQuery};

use crate::models::{AvailableSlots, CreateSlotRequest, DoctorStats, SlotQuery, UpdateDoctorRequest};
use crate::services::{DoctorService, SlotService};

// ==============================================================================
// DOCTOR PROFILE HANDLERS
// ==============================================================================

pub async fn list_doctors(
    State(state): State<AppState>,
) -> Result<Json<Vec<DoctorDetails>>, AppError> {
    let doctors = DoctorService::new(&state.repos).list_doctors().await?;
    Ok(Json(doctors))
}

pub async fn get_doctor(
    State(state): State<AppState>,
    ValidPath(doctor_id): ValidPath<Uuid>,
) -> Result<Json<DoctorDetails>, AppError> {
    let doctor = DoctorService::new(&state.repos).get_doctor(doctor_id).await?;
    Ok(Json(doctor))
}

pub async fn update_doctor(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidPath(doctor_id): ValidPath<Uuid>,
    ValidJson(request): ValidJson<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let doctor = DoctorService::new(&state.repos)
        .update_doctor(doctor_id, request, &user)
        .await?;

    Ok(Json(json!({
        "message": "Doctor updated successfully",
        "doctor": doctor
    })))
}

pub async fn get_doctor_stats(
    State(state): State<AppState>,
    ValidPath(doctor_id): ValidPath<Uuid>,
) -> Result<Json<DoctorStats>, AppError> {
    let stats = DoctorService::new(&state.repos).doctor_stats(doctor_id).await?;
    Ok(Json(stats))
}

pub async fn get_served_patients(
    State(state): State<AppState>,
    ValidPath(doctor_id): ValidPath<Uuid>,
) -> Result<Json<Vec<PatientDetails>>, AppError> {
    let patients = DoctorService::new(&state.repos).served_patients(doctor_id).await?;
    Ok(Json(patients))
}

// ==============================================================================
// SLOT HANDLERS
// ==============================================================================

pub async fn list_slots(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = SlotService::new(&state.repos).list_slots(query.doctor_id).await?;
    Ok(Json(json!({ "slots": slots })))
}

pub async fn create_slot(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidJson(request): ValidJson<CreateSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let slot = SlotService::new(&state.repos).create_slot_for(&user, request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Slot added",
        "slot": slot
    }))))
}

pub async fn get_available_slots(
    State(state): State<AppState>,
    ValidPath(doctor_id): ValidPath<Uuid>,
) -> Result<Json<AvailableSlots>, AppError> {
    let available = SlotService::new(&state.repos).list_available(doctor_id).await?;
    Ok(Json(available))
}
