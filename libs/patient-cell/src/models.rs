// libs/patient-cell/src/models.rs
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordQuery {
    /// Patient profile id or the patient's account id.
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecordRequest {
    pub patient_id: Uuid,
    /// Doctors writing their own records may leave this out.
    pub doctor_id: Option<Uuid>,
    pub diagnosis: String,
    pub prescription: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    pub patient_id: Uuid,
    pub content: String,
}

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound | PatientError::DoctorNotFound => AppError::NotFound(err.to_string()),
            PatientError::Forbidden(msg) => AppError::Forbidden(msg),
            PatientError::Validation(msg) => AppError::ValidationError(msg),
            PatientError::Store(store) => store.into(),
        }
    }
}
