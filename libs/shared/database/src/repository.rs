use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use shared_models::clinic::{
    Account, AccountUpdate, Appointment, AppointmentFilter, AppointmentStatus, Bill, BillFilter,
    DoctorProfile, DoctorUpdate, Feedback, MedicalRecord, NewAccount, NewAppointment, NewBill,
    NewDoctorProfile, NewFeedback, NewMedicalRecord, NewPatientProfile, NewSlot, PatientProfile,
    Slot, SlotClaim,
};
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create(&self, account: NewAccount) -> StoreResult<Account>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>>;
    /// Newest first.
    async fn list(&self) -> StoreResult<Vec<Account>>;
    async fn update(&self, id: Uuid, update: AccountUpdate) -> StoreResult<Option<Account>>;
    /// Removes the account together with its profile, appointments, bills,
    /// medical records and feedback. Returns false when nothing was deleted.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn create(&self, profile: NewPatientProfile) -> StoreResult<PatientProfile>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PatientProfile>>;
    async fn find_by_account(&self, account_id: Uuid) -> StoreResult<Option<PatientProfile>>;
    async fn list(&self) -> StoreResult<Vec<PatientProfile>>;
    async fn count(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait DoctorRepository: Send + Sync {
    async fn create(&self, profile: NewDoctorProfile) -> StoreResult<DoctorProfile>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<DoctorProfile>>;
    async fn find_by_account(&self, account_id: Uuid) -> StoreResult<Option<DoctorProfile>>;
    async fn list(&self) -> StoreResult<Vec<DoctorProfile>>;
    async fn update(&self, id: Uuid, update: DoctorUpdate) -> StoreResult<Option<DoctorProfile>>;
    async fn count(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Fails with `Conflict` when (doctor, date, time) already exists.
    async fn create(&self, slot: NewSlot) -> StoreResult<Slot>;
    /// Ordered by date, then time, descending.
    async fn list(&self, doctor_id: Option<Uuid>) -> StoreResult<Vec<Slot>>;
    async fn list_available(&self, doctor_id: Uuid) -> StoreResult<Vec<Slot>>;
    async fn find(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> StoreResult<Option<Slot>>;
    /// Flips a free slot to booked in one step.
    async fn claim(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> StoreResult<SlotClaim>;
    /// Marks the slot free. `None` when no slot exists at that time.
    async fn release(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> StoreResult<Option<Slot>>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn create(&self, appointment: NewAppointment) -> StoreResult<Appointment>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>>;
    /// Ordered by date, then time, descending.
    async fn list(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>>;
    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> StoreResult<Option<Appointment>>;
    /// Deleting an appointment also deletes its bill.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Fails with `Conflict` when the appointment already has a bill.
    async fn create(&self, bill: NewBill) -> StoreResult<Bill>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Bill>>;
    async fn find_by_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Bill>>;
    /// Newest first.
    async fn list(&self, filter: &BillFilter) -> StoreResult<Vec<Bill>>;
    async fn mark_paid(&self, id: Uuid) -> StoreResult<Option<Bill>>;
}

#[async_trait]
pub trait MedicalRecordRepository: Send + Sync {
    async fn create(&self, record: NewMedicalRecord) -> StoreResult<MedicalRecord>;
    /// Filtered by patient profile id, newest first.
    async fn list(&self, patient_id: Option<Uuid>) -> StoreResult<Vec<MedicalRecord>>;
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn create(&self, feedback: NewFeedback) -> StoreResult<Feedback>;
    async fn list(&self) -> StoreResult<Vec<Feedback>>;
}

/// One handle per entity, injected into every service.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub patients: Arc<dyn PatientRepository>,
    pub doctors: Arc<dyn DoctorRepository>,
    pub slots: Arc<dyn SlotRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub bills: Arc<dyn BillRepository>,
    pub records: Arc<dyn MedicalRecordRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
}

impl Repositories {
    /// Every repository backed by the same store value.
    pub fn from_store<S>(store: S) -> Self
    where
        S: AccountRepository
            + PatientRepository
            + DoctorRepository
            + SlotRepository
            + AppointmentRepository
            + BillRepository
            + MedicalRecordRepository
            + FeedbackRepository
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            accounts: store.clone(),
            patients: store.clone(),
            doctors: store.clone(),
            slots: store.clone(),
            appointments: store.clone(),
            bills: store.clone(),
            records: store.clone(),
            feedback: store,
        }
    }
}
