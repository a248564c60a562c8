// libs/doctor-cell/src/services/slots.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::repository::{DoctorRepository, SlotRepository};
use shared_database::{Repositories, StoreError};
use shared_models::auth::{Role, User};
use shared_models::clinic::{NewSlot, Slot};

use crate::models::{AvailableSlots, CreateSlotRequest, SlotError, SlotTime};
use crate::services::doctor::resolve_doctor;

pub struct SlotService {
    doctors: Arc<dyn DoctorRepository>,
    slots: Arc<dyn SlotRepository>,
}

impl SlotService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            doctors: Arc::clone(&repos.doctors),
            slots: Arc::clone(&repos.slots),
        }
    }

    async fn doctor_profile_id(&self, doctor_ref: Uuid) -> Result<Uuid, SlotError> {
        resolve_doctor(self.doctors.as_ref(), doctor_ref)
            .await?
            .map(|profile| profile.id)
            .ok_or(SlotError::DoctorNotFound)
    }

    /// Every slot, or one doctor's slots, newest date and time first.
    pub async fn list_slots(&self, doctor_ref: Option<Uuid>) -> Result<Vec<Slot>, SlotError> {
        let doctor_id = match doctor_ref {
            Some(doctor_ref) => Some(self.doctor_profile_id(doctor_ref).await?),
            None => None,
        };
        let slots = self.slots.list(doctor_id).await?;
        debug!("Found {} slots", slots.len());
        Ok(slots)
    }

    pub async fn create_slot(
        &self,
        doctor_ref: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Slot, SlotError> {
        let doctor_id = self.doctor_profile_id(doctor_ref).await?;

        let slot = self.slots
            .create(NewSlot { doctor_id, date, time })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => SlotError::Duplicate { date, time },
                other => SlotError::Store(other),
            })?;

        info!("Doctor {} opened slot {} {}", doctor_id, date, time);
        Ok(slot)
    }

    /// Slot creation on behalf of an authenticated caller. A doctor may only
    /// add slots to their own profile and may omit `doctor_id`.
    pub async fn create_slot_for(
        &self,
        user: &User,
        request: CreateSlotRequest,
    ) -> Result<Slot, SlotError> {
        let doctor_ref = match (user.role, request.doctor_id) {
            (Role::Doctor, requested) => {
                let own = resolve_doctor(self.doctors.as_ref(), user.id)
                    .await?
                    .ok_or(SlotError::DoctorNotFound)?;
                if let Some(requested) = requested {
                    if requested != own.id && requested != own.account_id {
                        return Err(SlotError::Forbidden(
                            "Doctors can only add slots to their own schedule".to_string(),
                        ));
                    }
                }
                own.id
            }
            (Role::Admin, Some(requested)) => requested,
            (Role::Admin, None) => {
                return Err(SlotError::Validation("doctor_id is required".to_string()));
            }
            (Role::Patient, _) => {
                return Err(SlotError::Forbidden(
                    "Only doctors and admins can add slots".to_string(),
                ));
            }
        };

        self.create_slot(doctor_ref, request.slot.date, request.slot.time).await
    }

    /// Free slots with the doctor's fee and specialty.
    pub async fn list_available(&self, doctor_ref: Uuid) -> Result<AvailableSlots, SlotError> {
        let doctor = resolve_doctor(self.doctors.as_ref(), doctor_ref)
            .await?
            .ok_or(SlotError::DoctorNotFound)?;

        let free = self.slots.list_available(doctor.id).await?;

        Ok(AvailableSlots {
            doctor_id: doctor.id,
            slots: free.iter().map(SlotTime::from).collect(),
            fee: doctor.fee,
            specialty: doctor.specialty,
        })
    }
}
