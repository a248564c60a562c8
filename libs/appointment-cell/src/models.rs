// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::clinic::{Appointment, Bill};
use shared_models::error::AppError;

// ==============================================================================
// REQUEST TYPES
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    /// Patient account id; a patient profile id is accepted too.
    #[serde(alias = "patient_id")]
    pub patient: Uuid,
    /// Doctor profile id or the doctor's account id.
    #[serde(alias = "doctor_id")]
    pub doctor: Uuid,
    pub date: NaiveDate,
    #[serde(deserialize_with = "shared_models::clock::deserialize")]
    pub time: NaiveTime,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

// ==============================================================================
// RESPONSE TYPES
// ==============================================================================

/// Appointment with the display names of both parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor_name: Option<String>,
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingOutcome {
    pub appointment: AppointmentView,
    pub bill: Bill,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Appointments can only be booked for patient accounts")]
    NotAPatient,

    #[error("This slot is already booked")]
    SlotAlreadyBooked,

    #[error("{0}")]
    Validation(String),

    #[error("Could not bill appointment: {0}")]
    BillingFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::PatientNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::NotAPatient => AppError::ValidationError(err.to_string()),
            AppointmentError::SlotAlreadyBooked => AppError::Conflict(err.to_string()),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::BillingFailed(_) => AppError::Internal(err.to_string()),
            AppointmentError::Store(store) => store.into(),
        }
    }
}
