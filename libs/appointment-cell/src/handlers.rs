// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::error::AppError;
use shared_utils::extractor::{ValidJson, ValidPath};

use crate::models::{AppointmentView, CreateAppointmentRequest, UpdateStatusRequest};
use crate::services::AppointmentBookingService;

pub async fn create_appointment(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let outcome = AppointmentBookingService::new(&state.repos)
        .create_appointment(request)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Appointment booked successfully",
        "appointment": outcome.appointment,
        "bill": outcome.bill
    }))))
}

pub async fn list_appointments(
    State(state): State<AppState>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let appointments = AppointmentBookingService::new(&state.repos)
        .list_appointments()
        .await?;
    Ok(Json(appointments))
}

pub async fn update_appointment_status(
    State(state): State<AppState>,
    ValidPath(appointment_id): ValidPath<Uuid>,
    ValidJson(request): ValidJson<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(&state.repos)
        .update_status(appointment_id, request.status)
        .await?;

    Ok(Json(json!({
        "message": format!("Appointment marked as {}", appointment.appointment.status),
        "appointment": appointment
    })))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    ValidPath(appointment_id): ValidPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    AppointmentBookingService::new(&state.repos)
        .delete_appointment(appointment_id)
        .await?;

    Ok(Json(json!({ "message": "Appointment deleted successfully" })))
}

pub async fn get_patient_appointments(
    State(state): State<AppState>,
    ValidPath(patient_id): ValidPath<Uuid>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let appointments = AppointmentBookingService::new(&state.repos)
        .list_for_patient(patient_id)
        .await?;
    Ok(Json(appointments))
}

pub async fn get_doctor_appointments(
    State(state): State<AppState>,
    ValidPath(doctor_id): ValidPath<Uuid>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let appointments = AppointmentBookingService::new(&state.repos)
        .list_for_doctor(doctor_id)
        .await?;
    Ok(Json(appointments))
}
