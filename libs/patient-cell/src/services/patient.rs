// libs/patient-cell/src/services/patient.rs
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_database::repository::{AccountRepository, PatientRepository};
use shared_database::{Repositories, StoreResult};
use shared_models::clinic::{PatientDetails, PatientProfile};

use crate::models::PatientError;

/// Looks a patient up by profile id, then by the owning account id.
pub async fn resolve_patient_profile(
    patients: &dyn PatientRepository,
    patient_ref: Uuid,
) -> StoreResult<Option<PatientProfile>> {
    if let Some(profile) = patients.find_by_id(patient_ref).await? {
        return Ok(Some(profile));
    }
    patients.find_by_account(patient_ref).await
}

pub struct PatientService {
    accounts: Arc<dyn AccountRepository>,
    patients: Arc<dyn PatientRepository>,
}

impl PatientService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            accounts: Arc::clone(&repos.accounts),
            patients: Arc::clone(&repos.patients),
        }
    }

    pub async fn list_patients(&self) -> Result<Vec<PatientDetails>, PatientError> {
        let profiles = self.patients.list().await?;
        let mut patients = Vec::with_capacity(profiles.len());
        for profile in profiles {
            if let Some(account) = self.accounts.find_by_id(profile.account_id).await? {
                patients.push(PatientDetails {
                    profile,
                    username: account.username,
                    phone: account.phone,
                });
            }
        }
        debug!("Listed {} patients", patients.len());
        Ok(patients)
    }

    pub async fn get_profile(&self, patient_ref: Uuid) -> Result<PatientProfile, PatientError> {
        resolve_patient_profile(self.patients.as_ref(), patient_ref)
            .await?
            .ok_or(PatientError::NotFound)
    }
}
