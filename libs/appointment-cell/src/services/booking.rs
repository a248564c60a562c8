// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use billing_cell::bill_amount_for_fee;
use doctor_cell::services::resolve_doctor;
use shared_database::repository::{
    AccountRepository, AppointmentRepository, BillRepository, DoctorRepository,
    PatientRepository, SlotRepository,
};
use shared_database::Repositories;
use shared_models::auth::Role;
use shared_models::clinic::{
    Account, Appointment, AppointmentFilter, AppointmentStatus, NewAppointment, NewBill,
    SlotClaim,
};

use crate::models::{
    AppointmentError, AppointmentView, BookingOutcome, CreateAppointmentRequest,
};

pub struct AppointmentBookingService {
    accounts: Arc<dyn AccountRepository>,
    patients: Arc<dyn PatientRepository>,
    doctors: Arc<dyn DoctorRepository>,
    slots: Arc<dyn SlotRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    bills: Arc<dyn BillRepository>,
}

impl AppointmentBookingService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            accounts: Arc::clone(&repos.accounts),
            patients: Arc::clone(&repos.patients),
            doctors: Arc::clone(&repos.doctors),
            slots: Arc::clone(&repos.slots),
            appointments: Arc::clone(&repos.appointments),
            bills: Arc::clone(&repos.bills),
        }
    }

    /// Books an appointment, claims its slot and bills it. Either all three
    /// happen or none of them is left behind.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<BookingOutcome, AppointmentError> {
        info!("Booking doctor {} on {} at {}", request.doctor, request.date, request.time);

        let doctor = resolve_doctor(self.doctors.as_ref(), request.doctor)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;
        let patient = self.resolve_patient(request.patient).await?;

        if self.slot_is_occupied(doctor.id, request.date, request.time, None).await? {
            return Err(AppointmentError::SlotAlreadyBooked);
        }

        let claimed = match self.slots.claim(doctor.id, request.date, request.time).await? {
            SlotClaim::Claimed(_) => true,
            SlotClaim::AlreadyBooked(_) => return Err(AppointmentError::SlotAlreadyBooked),
            SlotClaim::NoSlot => {
                debug!("No declared slot for doctor {} at {} {}", doctor.id, request.date, request.time);
                false
            }
        };

        let created = self.appointments.create(NewAppointment {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date: request.date,
            time: request.time,
            reason: request.reason.trim().to_string(),
            status: AppointmentStatus::Confirmed,
        }).await;

        let appointment = match created {
            Ok(appointment) => appointment,
            Err(e) => {
                if claimed {
                    self.release_slot_quietly(doctor.id, request.date, request.time).await;
                }
                return Err(e.into());
            }
        };

        let amount = bill_amount_for_fee(&doctor.fee);
        let bill = match self.bills.create(NewBill { appointment_id: appointment.id, amount }).await {
            Ok(bill) => bill,
            Err(e) => {
                error!("Billing failed for appointment {}: {}", appointment.id, e);
                if let Err(cleanup) = self.appointments.delete(appointment.id).await {
                    error!("Could not roll back appointment {}: {}", appointment.id, cleanup);
                }
                if claimed {
                    self.release_slot_quietly(doctor.id, request.date, request.time).await;
                }
                return Err(AppointmentError::BillingFailed(e.to_string()));
            }
        };

        info!("Appointment {} confirmed, bill {} for {}", appointment.id, bill.id, amount);
        let view = self.view(appointment, &mut NameCache::default()).await?;
        Ok(BookingOutcome { appointment: view, bill })
    }

    /// Sets a new status. Cancelling frees the slot; reviving a cancelled
    /// appointment claims it again.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        status: Option<String>,
    ) -> Result<AppointmentView, AppointmentError> {
        let current = self.appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let raw = status.unwrap_or_default();
        if raw.trim().is_empty() {
            return Err(AppointmentError::Validation("Status is required".to_string()));
        }
        let next = AppointmentStatus::from(raw);

        let cancelling = current.is_active() && next.is_cancelled();
        let reviving = !current.is_active() && !next.is_cancelled();

        let mut claimed = false;
        if cancelling {
            self.release_slot_quietly(current.doctor_id, current.date, current.time).await;
        } else if reviving {
            if self.slot_is_occupied(current.doctor_id, current.date, current.time, Some(current.id)).await? {
                return Err(AppointmentError::SlotAlreadyBooked);
            }
            match self.slots.claim(current.doctor_id, current.date, current.time).await? {
                SlotClaim::Claimed(_) => claimed = true,
                SlotClaim::AlreadyBooked(_) => return Err(AppointmentError::SlotAlreadyBooked),
                SlotClaim::NoSlot => {}
            }
        }

        let updated = match self.appointments.update_status(appointment_id, next.clone()).await {
            Ok(Some(updated)) => updated,
            outcome => {
                if claimed {
                    self.release_slot_quietly(current.doctor_id, current.date, current.time).await;
                }
                if cancelling {
                    if let Err(e) = self.slots.claim(current.doctor_id, current.date, current.time).await {
                        warn!("Could not restore slot of appointment {}: {}", current.id, e);
                    }
                }
                return match outcome {
                    Err(e) => Err(e.into()),
                    _ => Err(AppointmentError::NotFound),
                };
            }
        };

        info!("Appointment {} marked as {}", updated.id, next);
        self.view(updated, &mut NameCache::default()).await
    }

    /// Removes the appointment and its bill, freeing the slot if it was held.
    pub async fn delete_appointment(&self, appointment_id: Uuid) -> Result<(), AppointmentError> {
        let appointment = self.appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.is_active() {
            self.release_slot_quietly(appointment.doctor_id, appointment.date, appointment.time).await;
        }

        if !self.appointments.delete(appointment_id).await? {
            return Err(AppointmentError::NotFound);
        }

        info!("Deleted appointment {}", appointment_id);
        Ok(())
    }

    pub async fn list_appointments(&self) -> Result<Vec<AppointmentView>, AppointmentError> {
        let appointments = self.appointments.list(&AppointmentFilter::default()).await?;
        self.views(appointments).await
    }

    pub async fn list_for_patient(&self, patient_ref: Uuid) -> Result<Vec<AppointmentView>, AppointmentError> {
        let patient = self.resolve_patient(patient_ref).await?;
        let appointments = self.appointments
            .list(&AppointmentFilter::for_patient(patient.id))
            .await?;
        self.views(appointments).await
    }

    pub async fn list_for_doctor(&self, doctor_ref: Uuid) -> Result<Vec<AppointmentView>, AppointmentError> {
        let doctor = resolve_doctor(self.doctors.as_ref(), doctor_ref)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;
        let appointments = self.appointments
            .list(&AppointmentFilter::for_doctor(doctor.id))
            .await?;
        self.views(appointments).await
    }

    /// Frees the slots held by a patient's active appointments. Returns how
    /// many slots were released.
    pub async fn release_slots_for_patient(&self, patient_account_id: Uuid) -> Result<usize, AppointmentError> {
        let appointments = self.appointments
            .list(&AppointmentFilter::for_patient(patient_account_id))
            .await?;

        let mut released = 0;
        for appointment in appointments.iter().filter(|a| a.is_active()) {
            if self.slots
                .release(appointment.doctor_id, appointment.date, appointment.time)
                .await?
                .is_some()
            {
                released += 1;
            }
        }

        debug!("Released {} slots for patient {}", released, patient_account_id);
        Ok(released)
    }

    // ==========================================================================
    // HELPERS
    // ==========================================================================

    /// Account id first, then patient profile id.
    async fn resolve_patient(&self, patient_ref: Uuid) -> Result<Account, AppointmentError> {
        let account = match self.accounts.find_by_id(patient_ref).await? {
            Some(account) => Some(account),
            None => match self.patients.find_by_id(patient_ref).await? {
                Some(profile) => self.accounts.find_by_id(profile.account_id).await?,
                None => None,
            },
        };

        let account = account.ok_or(AppointmentError::PatientNotFound)?;
        if account.role != Role::Patient {
            return Err(AppointmentError::NotAPatient);
        }
        Ok(account)
    }

    async fn slot_is_occupied(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        ignore: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        let existing = self.appointments
            .list(&AppointmentFilter::at(doctor_id, date, time))
            .await?;
        Ok(existing
            .iter()
            .any(|a| a.is_active() && Some(a.id) != ignore))
    }

    async fn release_slot_quietly(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) {
        match self.slots.release(doctor_id, date, time).await {
            Ok(Some(_)) => debug!("Released slot of doctor {} at {} {}", doctor_id, date, time),
            Ok(None) => debug!("No slot to release for doctor {} at {} {}", doctor_id, date, time),
            Err(e) => warn!("Could not release slot of doctor {} at {} {}: {}", doctor_id, date, time, e),
        }
    }

    async fn views(&self, appointments: Vec<Appointment>) -> Result<Vec<AppointmentView>, AppointmentError> {
        let mut names = NameCache::default();
        let mut views = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            views.push(self.view(appointment, &mut names).await?);
        }
        Ok(views)
    }

    async fn view(&self, appointment: Appointment, names: &mut NameCache) -> Result<AppointmentView, AppointmentError> {
        let doctor_name = match names.doctors.get(&appointment.doctor_id) {
            Some(name) => name.clone(),
            None => {
                let name = match self.doctors.find_by_id(appointment.doctor_id).await? {
                    Some(profile) => self.accounts
                        .find_by_id(profile.account_id)
                        .await?
                        .map(|a| a.username),
                    None => None,
                };
                names.doctors.insert(appointment.doctor_id, name.clone());
                name
            }
        };

        let patient_name = match names.patients.get(&appointment.patient_id) {
            Some(name) => name.clone(),
            None => {
                let name = self.accounts
                    .find_by_id(appointment.patient_id)
                    .await?
                    .map(|a| a.username);
                names.patients.insert(appointment.patient_id, name.clone());
                name
            }
        };

        Ok(AppointmentView { appointment, doctor_name, patient_name })
    }
}

#[derive(Default)]
struct NameCache {
    doctors: HashMap<Uuid, Option<String>>,
    patients: HashMap<Uuid, Option<String>>,
}
