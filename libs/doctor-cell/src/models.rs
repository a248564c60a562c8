// libs/doctor-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::clinic::Slot;
use shared_models::error::AppError;

// ==============================================================================
// DOCTOR PROFILE TYPES
// ==============================================================================

/// Partial update of a doctor's profile and the owning account's public fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDoctorRequest {
    pub specialty: Option<String>,
    pub fee: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
}

impl UpdateDoctorRequest {
    pub fn is_empty(&self) -> bool {
        self.specialty.is_none()
            && self.fee.is_none()
            && self.username.is_none()
            && self.phone.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorStats {
    pub total_appointments: u64,
    pub completed_appointments: u64,
    /// Appointments still `confirmed`.
    pub pending_appointments: u64,
    pub unique_patients: u64,
}

// ==============================================================================
// SLOT TYPES
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotQuery {
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotInput {
    pub date: NaiveDate,
    #[serde(deserialize_with = "shared_models::clock::deserialize")]
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlotRequest {
    /// Doctor profile or account id. Doctors may leave it out to mean themselves.
    pub doctor_id: Option<Uuid>,
    pub slot: SlotInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotTime {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl From<&Slot> for SlotTime {
    fn from(slot: &Slot) -> Self {
        Self { date: slot.date, time: slot.time }
    }
}

/// What a prospective patient sees for one doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlots {
    pub doctor_id: Uuid,
    pub slots: Vec<SlotTime>,
    pub fee: String,
    pub specialty: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::Forbidden(msg) => AppError::Forbidden(msg),
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::Store(store) => store.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("A slot already exists for {date} at {time}")]
    Duplicate { date: NaiveDate, time: NaiveTime },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SlotError {
    fn from(err: StoreError) -> Self {
        SlotError::Store(err)
    }
}

impl From<DoctorError> for SlotError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => SlotError::DoctorNotFound,
            DoctorError::Forbidden(msg) => SlotError::Forbidden(msg),
            DoctorError::Validation(msg) => SlotError::Validation(msg),
            DoctorError::Store(store) => SlotError::Store(store),
        }
    }
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::DoctorNotFound => AppError::NotFound(err.to_string()),
            SlotError::Duplicate { .. } => AppError::Conflict(err.to_string()),
            SlotError::Forbidden(msg) => AppError::Forbidden(msg),
            SlotError::Validation(msg) => AppError::ValidationError(msg),
            SlotError::Store(store) => store.into(),
        }
    }
}
