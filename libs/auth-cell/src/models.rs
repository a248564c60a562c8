// libs/auth-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::auth::Role;
use shared_models::clinic::{Account, DoctorProfile, PatientProfile};
use shared_models::error::AppError;

pub const DEFAULT_SPECIALTY: &str = "General";
pub const DEFAULT_FEE: &str = "PKR 2000";
pub const MAX_PHONE_LEN: usize = 15;

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub phone: String,
    #[serde(flatten)]
    pub profile: SignupProfile,
}

/// Role-specific signup data, selected by the `category` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum SignupProfile {
    Patient {
        gender: String,
        blood_group: String,
    },
    Doctor {
        #[serde(default)]
        specialty: Option<String>,
        #[serde(default)]
        fee: Option<String>,
    },
    Admin,
}

impl SignupProfile {
    pub fn role(&self) -> Role {
        match self {
            SignupProfile::Patient { .. } => Role::Patient,
            SignupProfile::Doctor { .. } => Role::Doctor,
            SignupProfile::Admin => Role::Admin,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SignupOutcome {
    pub account: Account,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorProfile>,
}

impl SignupOutcome {
    pub fn patient_id(&self) -> Option<Uuid> {
        self.patient.as_ref().map(|p| p.id)
    }

    pub fn doctor_id(&self) -> Option<Uuid> {
        self.doctor.as_ref().map(|d| d.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub role: Role,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<Uuid>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("All fields are required")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Token issuance failed: {0}")]
    Token(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<argon2::password_hash::Error> for AccountError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AccountError::PasswordHash(err.to_string())
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(msg) => AppError::ValidationError(msg),
            AccountError::MissingCredentials => AppError::ValidationError(err.to_string()),
            AccountError::InvalidCredentials => AppError::Auth(err.to_string()),
            AccountError::NotFound => AppError::NotFound(err.to_string()),
            AccountError::Forbidden(msg) => AppError::Forbidden(msg),
            AccountError::PasswordHash(msg) | AccountError::Token(msg) => AppError::Internal(msg),
            AccountError::Store(store) => store.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signup_category_selects_profile_variant() {
        let request: SignupRequest = serde_json::from_value(json!({
            "username": "dr.khan",
            "password": "pw",
            "phone": "0300",
            "category": "doctor",
            "fee": "PKR 1500"
        })).unwrap();

        assert_eq!(request.profile.role(), Role::Doctor);
        match request.profile {
            SignupProfile::Doctor { specialty, fee } => {
                assert_eq!(specialty, None);
                assert_eq!(fee.as_deref(), Some("PKR 1500"));
            }
            other => panic!("unexpected profile {:?}", other),
        }
    }

    #[test]
    fn patient_signup_requires_profile_fields() {
        let result: Result<SignupRequest, _> = serde_json::from_value(json!({
            "username": "amina",
            "password": "pw",
            "phone": "0300",
            "category": "patient"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let result: Result<SignupRequest, _> = serde_json::from_value(json!({
            "username": "x",
            "password": "pw",
            "phone": "0300",
            "category": "nurse"
        }));
        assert!(result.is_err());
    }
}
