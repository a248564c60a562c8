// libs/patient-cell/src/services/records.rs
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use doctor_cell::services::resolve_doctor;
use shared_database::repository::{DoctorRepository, MedicalRecordRepository, PatientRepository};
use shared_database::Repositories;
use shared_models::auth::{Role, User};
use shared_models::clinic::{MedicalRecord, NewMedicalRecord};

use crate::models::{CreateRecordRequest, PatientError};
use crate::services::patient::resolve_patient_profile;

pub struct MedicalRecordService {
    patients: Arc<dyn PatientRepository>,
    doctors: Arc<dyn DoctorRepository>,
    records: Arc<dyn MedicalRecordRepository>,
}

impl MedicalRecordService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            patients: Arc::clone(&repos.patients),
            doctors: Arc::clone(&repos.doctors),
            records: Arc::clone(&repos.records),
        }
    }

    /// All records, or one patient's, newest first.
    pub async fn list_records(&self, patient_ref: Option<Uuid>) -> Result<Vec<MedicalRecord>, PatientError> {
        let patient_id = match patient_ref {
            Some(patient_ref) => Some(
                resolve_patient_profile(self.patients.as_ref(), patient_ref)
                    .await?
                    .ok_or(PatientError::NotFound)?
                    .id,
            ),
            None => None,
        };
        Ok(self.records.list(patient_id).await?)
    }

    pub async fn create_record(
        &self,
        user: &User,
        request: CreateRecordRequest,
    ) -> Result<MedicalRecord, PatientError> {
        let diagnosis = request.diagnosis.trim();
        let prescription = request.prescription.trim();
        if diagnosis.is_empty() || prescription.is_empty() {
            return Err(PatientError::Validation(
                "Diagnosis and prescription are required".to_string(),
            ));
        }

        let patient = resolve_patient_profile(self.patients.as_ref(), request.patient_id)
            .await?
            .ok_or(PatientError::NotFound)?;

        let doctor = match (user.role, request.doctor_id) {
            (Role::Doctor, requested) => {
                let own = resolve_doctor(self.doctors.as_ref(), user.id)
                    .await?
                    .ok_or(PatientError::DoctorNotFound)?;
                if requested.is_some_and(|id| id != own.id && id != own.account_id) {
                    return Err(PatientError::Forbidden(
                        "Doctors can only write records under their own name".to_string(),
                    ));
                }
                own
            }
            (Role::Admin, Some(requested)) => resolve_doctor(self.doctors.as_ref(), requested)
                .await?
                .ok_or(PatientError::DoctorNotFound)?,
            (Role::Admin, None) => {
                return Err(PatientError::Validation("doctor_id is required".to_string()));
            }
            (Role::Patient, _) => {
                return Err(PatientError::Forbidden(
                    "Only doctors and admins can add medical records".to_string(),
                ));
            }
        };

        let record = self.records.create(NewMedicalRecord {
            patient_id: patient.id,
            doctor_id: doctor.id,
            diagnosis: diagnosis.to_string(),
            prescription: prescription.to_string(),
            notes: request.notes.trim().to_string(),
            tests: request.tests
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }).await?;

        info!("Doctor {} added record {} for patient {}", doctor.id, record.id, patient.id);
        Ok(record)
    }
}
