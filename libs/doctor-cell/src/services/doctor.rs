// libs/doctor-cell/src/services/doctor.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::repository::{
    AccountRepository, AppointmentRepository, DoctorRepository, PatientRepository,
};
use shared_database::{Repositories, StoreResult};
use shared_models::auth::{Role, User};
use shared_models::clinic::{
    AccountUpdate, AppointmentFilter, AppointmentStatus, DoctorDetails, DoctorProfile,
    DoctorUpdate, PatientDetails,
};

use crate::models::{DoctorError, DoctorStats, UpdateDoctorRequest};

const MAX_PHONE_LEN: usize = 15;

/// Looks a doctor up by profile id, then by the owning account id.
pub async fn resolve_doctor(
    doctors: &dyn DoctorRepository,
    doctor_ref: Uuid,
) -> StoreResult<Option<DoctorProfile>> {
    if let Some(profile) = doctors.find_by_id(doctor_ref).await? {
        return Ok(Some(profile));
    }
    doctors.find_by_account(doctor_ref).await
}

pub struct DoctorService {
    accounts: Arc<dyn AccountRepository>,
    doctors: Arc<dyn DoctorRepository>,
    patients: Arc<dyn PatientRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl DoctorService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            accounts: Arc::clone(&repos.accounts),
            doctors: Arc::clone(&repos.doctors),
            patients: Arc::clone(&repos.patients),
            appointments: Arc::clone(&repos.appointments),
        }
    }

    pub async fn resolve(&self, doctor_ref: Uuid) -> Result<DoctorProfile, DoctorError> {
        resolve_doctor(self.doctors.as_ref(), doctor_ref)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    async fn with_account(&self, profile: DoctorProfile) -> Result<DoctorDetails, DoctorError> {
        let account = self.accounts
            .find_by_id(profile.account_id)
            .await?
            .ok_or(DoctorError::NotFound)?;

        Ok(DoctorDetails {
            profile,
            username: account.username,
            phone: account.phone,
        })
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorDetails>, DoctorError> {
        let profiles = self.doctors.list().await?;
        let mut doctors = Vec::with_capacity(profiles.len());
        for profile in profiles {
            // A profile whose account vanished mid-listing is skipped.
            if let Some(account) = self.accounts.find_by_id(profile.account_id).await? {
                doctors.push(DoctorDetails {
                    profile,
                    username: account.username,
                    phone: account.phone,
                });
            }
        }
        debug!("Listed {} doctors", doctors.len());
        Ok(doctors)
    }

    pub async fn get_doctor(&self, doctor_ref: Uuid) -> Result<DoctorDetails, DoctorError> {
        let profile = self.resolve(doctor_ref).await?;
        self.with_account(profile).await
    }

    /// Only the doctor who owns the profile, or an admin, may edit it.
    pub async fn update_doctor(
        &self,
        doctor_ref: Uuid,
        request: UpdateDoctorRequest,
        user: &User,
    ) -> Result<DoctorDetails, DoctorError> {
        let profile = self.resolve(doctor_ref).await?;

        if user.role != Role::Admin && user.id != profile.account_id {
            return Err(DoctorError::Forbidden(
                "Only the doctor or an admin can edit this profile".to_string(),
            ));
        }
        if request.is_empty() {
            return Err(DoctorError::Validation("No fields to update".to_string()));
        }

        let account_update = AccountUpdate {
            username: trimmed(request.username, "Username")?,
            phone: trimmed(request.phone, "Phone")?,
            password_hash: None,
        };
        if let Some(phone) = &account_update.phone {
            if phone.chars().count() > MAX_PHONE_LEN {
                return Err(DoctorError::Validation(format!(
                    "Phone number must be at most {} characters",
                    MAX_PHONE_LEN
                )));
            }
        }

        let doctor_update = DoctorUpdate {
            specialty: trimmed(request.specialty, "Specialty")?,
            fee: trimmed(request.fee, "Fee")?,
        };

        if !account_update.is_empty() {
            self.accounts
                .update(profile.account_id, account_update)
                .await?
                .ok_or(DoctorError::NotFound)?;
        }

        let profile = if doctor_update.specialty.is_some() || doctor_update.fee.is_some() {
            self.doctors
                .update(profile.id, doctor_update)
                .await?
                .ok_or(DoctorError::NotFound)?
        } else {
            profile
        };

        info!("Doctor {} updated by {}", profile.id, user.username);
        self.with_account(profile).await
    }

    pub async fn doctor_stats(&self, doctor_ref: Uuid) -> Result<DoctorStats, DoctorError> {
        let profile = self.resolve(doctor_ref).await?;
        let appointments = self.appointments
            .list(&AppointmentFilter::for_doctor(profile.id))
            .await?;

        let mut stats = DoctorStats {
            total_appointments: appointments.len() as u64,
            completed_appointments: 0,
            pending_appointments: 0,
            unique_patients: 0,
        };
        let mut served = BTreeSet::new();
        for appointment in &appointments {
            match appointment.status {
                AppointmentStatus::Completed => {
                    stats.completed_appointments += 1;
                    served.insert(appointment.patient_id);
                }
                AppointmentStatus::Confirmed => stats.pending_appointments += 1,
                _ => {}
            }
        }
        stats.unique_patients = served.len() as u64;

        Ok(stats)
    }

    /// Distinct patients with at least one completed appointment with this doctor.
    pub async fn served_patients(&self, doctor_ref: Uuid) -> Result<Vec<PatientDetails>, DoctorError> {
        let profile = self.resolve(doctor_ref).await?;
        let completed = self.appointments
            .list(&AppointmentFilter::for_doctor(profile.id).with_status(AppointmentStatus::Completed))
            .await?;

        let account_ids: BTreeSet<Uuid> = completed.iter().map(|a| a.patient_id).collect();

        let mut patients = Vec::with_capacity(account_ids.len());
        for account_id in account_ids {
            let Some(patient) = self.patients.find_by_account(account_id).await? else {
                continue;
            };
            let Some(account) = self.accounts.find_by_id(account_id).await? else {
                continue;
            };
            patients.push(PatientDetails {
                profile: patient,
                username: account.username,
                phone: account.phone,
            });
        }

        Ok(patients)
    }
}

fn trimmed(value: Option<String>, field: &str) -> Result<Option<String>, DoctorError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => {
            Err(DoctorError::Validation(format!("{} cannot be empty", field)))
        }
        Some(v) => Ok(Some(v.trim().to_string())),
    }
}
