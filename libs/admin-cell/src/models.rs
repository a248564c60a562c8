// libs/admin-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::AppointmentError;
use auth_cell::AccountError;
use billing_cell::BillingError;
use patient_cell::PatientError;
use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_doctors: u64,
    pub total_patients: u64,
    pub total_appointments: u64,
    /// Sum of paid bills.
    pub total_revenue: i64,
}

/// Partial account edit. The password is re-hashed before it is stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::UserNotFound => AppError::NotFound(err.to_string()),
            AdminError::Validation(msg) => AppError::ValidationError(msg),
            AdminError::Account(e) => e.into(),
            AdminError::Appointment(e) => e.into(),
            AdminError::Billing(e) => e.into(),
            AdminError::Patient(e) => e.into(),
            AdminError::Store(e) => e.into(),
        }
    }
}
