use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::clinic::{
    Account, AccountUpdate, Appointment, AppointmentFilter, AppointmentStatus, Bill, BillFilter,
    BillStatus, DoctorProfile, DoctorUpdate, Feedback, MedicalRecord, NewAccount, NewAppointment,
    NewBill, NewDoctorProfile, NewFeedback, NewMedicalRecord, NewPatientProfile, NewSlot,
    PatientProfile, Slot, SlotClaim,
};

use crate::repository::{
    AccountRepository, AppointmentRepository, BillRepository, DoctorRepository,
    FeedbackRepository, MedicalRecordRepository, PatientRepository, SlotRepository, StoreError,
    StoreResult,
};

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    patients: Vec<PatientProfile>,
    doctors: Vec<DoctorProfile>,
    slots: Vec<Slot>,
    appointments: Vec<Appointment>,
    bills: Vec<Bill>,
    records: Vec<MedicalRecord>,
    feedback: Vec<Feedback>,
}

impl Tables {
    fn remove_appointments<F>(&mut self, predicate: F)
    where
        F: Fn(&Appointment) -> bool,
    {
        let removed: Vec<Uuid> = self.appointments.iter()
            .filter(|a| predicate(a))
            .map(|a| a.id)
            .collect();
        self.appointments.retain(|a| !removed.contains(&a.id));
        self.bills.retain(|b| !removed.contains(&b.appointment_id));
    }

    fn slot_mut(&mut self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> Option<&mut Slot> {
        self.slots.iter_mut()
            .find(|s| s.doctor_id == doctor_id && s.date == date && s.time == time)
    }
}

/// Process-local store. All tables sit behind one lock, so every repository
/// call observes and mutates a consistent snapshot.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        let mut tables = self.tables.write().await;
        if tables.accounts.iter().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(format!("Username {} is already taken", account.username)));
        }

        let account = Account {
            id: Uuid::new_v4(),
            username: account.username,
            phone: account.phone,
            password_hash: account.password_hash,
            role: account.role,
            created_at: Utc::now(),
        };
        tables.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.iter().find(|a| a.username == username).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        let tables = self.tables.read().await;
        // Reverse insertion order keeps ties on created_at newest-first too.
        let mut accounts: Vec<Account> = tables.accounts.iter().rev().cloned().collect();
        accounts.sort_by_key(|a| Reverse(a.created_at));
        Ok(accounts)
    }

    async fn update(&self, id: Uuid, update: AccountUpdate) -> StoreResult<Option<Account>> {
        let mut tables = self.tables.write().await;
        if let Some(username) = &update.username {
            if tables.accounts.iter().any(|a| a.id != id && &a.username == username) {
                return Err(StoreError::Conflict(format!("Username {} is already taken", username)));
            }
        }

        let Some(account) = tables.accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(username) = update.username {
            account.username = username;
        }
        if let Some(phone) = update.phone {
            account.phone = phone;
        }
        if let Some(password_hash) = update.password_hash {
            account.password_hash = password_hash;
        }
        Ok(Some(account.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.accounts.len();
        tables.accounts.retain(|a| a.id != id);
        if tables.accounts.len() == before {
            return Ok(false);
        }

        let patient_ids: Vec<Uuid> = tables.patients.iter()
            .filter(|p| p.account_id == id)
            .map(|p| p.id)
            .collect();
        let doctor_ids: Vec<Uuid> = tables.doctors.iter()
            .filter(|d| d.account_id == id)
            .map(|d| d.id)
            .collect();

        tables.patients.retain(|p| p.account_id != id);
        tables.doctors.retain(|d| d.account_id != id);
        tables.slots.retain(|s| !doctor_ids.contains(&s.doctor_id));
        tables.records.retain(|r| {
            !patient_ids.contains(&r.patient_id) && !doctor_ids.contains(&r.doctor_id)
        });
        tables.remove_appointments(|a| a.patient_id == id || doctor_ids.contains(&a.doctor_id));
        tables.feedback.retain(|f| f.patient_id != id);

        debug!("Deleted account {} with dependent rows", id);
        Ok(true)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.accounts.len() as u64)
    }
}

#[async_trait]
impl PatientRepository for MemoryStore {
    async fn create(&self, profile: NewPatientProfile) -> StoreResult<PatientProfile> {
        let mut tables = self.tables.write().await;
        if tables.patients.iter().any(|p| p.account_id == profile.account_id) {
            return Err(StoreError::Conflict("Account already has a patient profile".to_string()));
        }

        let profile = PatientProfile {
            id: Uuid::new_v4(),
            account_id: profile.account_id,
            gender: profile.gender,
            blood_group: profile.blood_group,
        };
        tables.patients.push(profile.clone());
        Ok(profile)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PatientProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.patients.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_account(&self, account_id: Uuid) -> StoreResult<Option<PatientProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.patients.iter().find(|p| p.account_id == account_id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<PatientProfile>> {
        Ok(self.tables.read().await.patients.clone())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.patients.len() as u64)
    }
}

#[async_trait]
impl DoctorRepository for MemoryStore {
    async fn create(&self, profile: NewDoctorProfile) -> StoreResult<DoctorProfile> {
        let mut tables = self.tables.write().await;
        if tables.doctors.iter().any(|d| d.account_id == profile.account_id) {
            return Err(StoreError::Conflict("Account already has a doctor profile".to_string()));
        }

        let profile = DoctorProfile {
            id: Uuid::new_v4(),
            account_id: profile.account_id,
            specialty: profile.specialty,
            fee: profile.fee,
            slots: Vec::new(),
        };
        tables.doctors.push(profile.clone());
        Ok(profile)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<DoctorProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_account(&self, account_id: Uuid) -> StoreResult<Option<DoctorProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.iter().find(|d| d.account_id == account_id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<DoctorProfile>> {
        Ok(self.tables.read().await.doctors.clone())
    }

    async fn update(&self, id: Uuid, update: DoctorUpdate) -> StoreResult<Option<DoctorProfile>> {
        let mut tables = self.tables.write().await;
        let Some(doctor) = tables.doctors.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        if let Some(specialty) = update.specialty {
            doctor.specialty = specialty;
        }
        if let Some(fee) = update.fee {
            doctor.fee = fee;
        }
        Ok(Some(doctor.clone()))
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.doctors.len() as u64)
    }
}

fn sort_slots_desc(slots: &mut [Slot]) {
    slots.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
}

#[async_trait]
impl SlotRepository for MemoryStore {
    async fn create(&self, slot: NewSlot) -> StoreResult<Slot> {
        let mut tables = self.tables.write().await;
        if tables.slot_mut(slot.doctor_id, slot.date, slot.time).is_some() {
            return Err(StoreError::Conflict(format!(
                "Slot {} {} already exists for this doctor", slot.date, slot.time
            )));
        }

        let slot = Slot {
            id: Uuid::new_v4(),
            doctor_id: slot.doctor_id,
            date: slot.date,
            time: slot.time,
            is_booked: false,
        };
        tables.slots.push(slot.clone());
        Ok(slot)
    }

    async fn list(&self, doctor_id: Option<Uuid>) -> StoreResult<Vec<Slot>> {
        let tables = self.tables.read().await;
        let mut slots: Vec<Slot> = tables.slots.iter()
            .filter(|s| doctor_id.map_or(true, |id| s.doctor_id == id))
            .cloned()
            .collect();
        sort_slots_desc(&mut slots);
        Ok(slots)
    }

    async fn list_available(&self, doctor_id: Uuid) -> StoreResult<Vec<Slot>> {
        let tables = self.tables.read().await;
        let mut slots: Vec<Slot> = tables.slots.iter()
            .filter(|s| s.doctor_id == doctor_id && !s.is_booked)
            .cloned()
            .collect();
        sort_slots_desc(&mut slots);
        Ok(slots)
    }

    async fn find(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> StoreResult<Option<Slot>> {
        let tables = self.tables.read().await;
        Ok(tables.slots.iter()
            .find(|s| s.doctor_id == doctor_id && s.date == date && s.time == time)
            .cloned())
    }

    async fn claim(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> StoreResult<SlotClaim> {
        let mut tables = self.tables.write().await;
        let claim = match tables.slot_mut(doctor_id, date, time) {
            None => SlotClaim::NoSlot,
            Some(slot) if slot.is_booked => SlotClaim::AlreadyBooked(slot.clone()),
            Some(slot) => {
                slot.is_booked = true;
                SlotClaim::Claimed(slot.clone())
            }
        };
        Ok(claim)
    }

    async fn release(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> StoreResult<Option<Slot>> {
        let mut tables = self.tables.write().await;
        Ok(tables.slot_mut(doctor_id, date, time).map(|slot| {
            slot.is_booked = false;
            slot.clone()
        }))
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn create(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.iter().any(|a| a.id == appointment.patient_id) {
            return Err(StoreError::NotFound("Patient".to_string()));
        }
        if !tables.doctors.iter().any(|d| d.id == appointment.doctor_id) {
            return Err(StoreError::NotFound("Doctor".to_string()));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date,
            time: appointment.time,
            reason: appointment.reason,
            status: appointment.status,
            created_at: Utc::now(),
        };
        tables.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        let tables = self.tables.read().await;
        Ok(tables.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables.appointments.iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        appointments.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
        Ok(appointments)
    }

    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> StoreResult<Option<Appointment>> {
        let mut tables = self.tables.write().await;
        Ok(tables.appointments.iter_mut().find(|a| a.id == id).map(|appointment| {
            appointment.status = status;
            appointment.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.appointments.len();
        tables.remove_appointments(|a| a.id == id);
        Ok(tables.appointments.len() != before)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.appointments.len() as u64)
    }
}

#[async_trait]
impl BillRepository for MemoryStore {
    async fn create(&self, bill: NewBill) -> StoreResult<Bill> {
        let mut tables = self.tables.write().await;
        if !tables.appointments.iter().any(|a| a.id == bill.appointment_id) {
            return Err(StoreError::NotFound("Appointment".to_string()));
        }
        if tables.bills.iter().any(|b| b.appointment_id == bill.appointment_id) {
            return Err(StoreError::Conflict("Appointment already has a bill".to_string()));
        }

        let bill = Bill {
            id: Uuid::new_v4(),
            appointment_id: bill.appointment_id,
            amount: bill.amount,
            status: BillStatus::Unpaid,
            created_at: Utc::now(),
        };
        tables.bills.push(bill.clone());
        Ok(bill)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Bill>> {
        let tables = self.tables.read().await;
        Ok(tables.bills.iter().find(|b| b.id == id).cloned())
    }

    async fn find_by_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Bill>> {
        let tables = self.tables.read().await;
        Ok(tables.bills.iter().find(|b| b.appointment_id == appointment_id).cloned())
    }

    async fn list(&self, filter: &BillFilter) -> StoreResult<Vec<Bill>> {
        let tables = self.tables.read().await;
        let owned_by_patient = |bill: &Bill| match filter.patient_id {
            None => true,
            Some(patient_id) => tables.appointments.iter()
                .any(|a| a.id == bill.appointment_id && a.patient_id == patient_id),
        };

        let mut bills: Vec<Bill> = tables.bills.iter()
            .rev()
            .filter(|b| filter.status.map_or(true, |status| b.status == status))
            .filter(|b| owned_by_patient(b))
            .cloned()
            .collect();
        bills.sort_by_key(|b| Reverse(b.created_at));
        Ok(bills)
    }

    async fn mark_paid(&self, id: Uuid) -> StoreResult<Option<Bill>> {
        let mut tables = self.tables.write().await;
        Ok(tables.bills.iter_mut().find(|b| b.id == id).map(|bill| {
            bill.status = BillStatus::Paid;
            bill.clone()
        }))
    }
}

#[async_trait]
impl MedicalRecordRepository for MemoryStore {
    async fn create(&self, record: NewMedicalRecord) -> StoreResult<MedicalRecord> {
        let mut tables = self.tables.write().await;
        let record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id: record.patient_id,
            doctor_id: record.doctor_id,
            diagnosis: record.diagnosis,
            prescription: record.prescription,
            notes: record.notes,
            tests: record.tests,
            date: Utc::now().date_naive(),
        };
        tables.records.push(record.clone());
        Ok(record)
    }

    async fn list(&self, patient_id: Option<Uuid>) -> StoreResult<Vec<MedicalRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<MedicalRecord> = tables.records.iter()
            .rev()
            .filter(|r| patient_id.map_or(true, |id| r.patient_id == id))
            .cloned()
            .collect();
        records.sort_by_key(|r| Reverse(r.date));
        Ok(records)
    }
}

#[async_trait]
impl FeedbackRepository for MemoryStore {
    async fn create(&self, feedback: NewFeedback) -> StoreResult<Feedback> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.iter().any(|a| a.id == feedback.patient_id) {
            return Err(StoreError::NotFound("Patient".to_string()));
        }

        let feedback = Feedback {
            id: Uuid::new_v4(),
            patient_id: feedback.patient_id,
            content: feedback.content,
            created_at: Utc::now(),
        };
        tables.feedback.push(feedback.clone());
        Ok(feedback)
    }

    async fn list(&self) -> StoreResult<Vec<Feedback>> {
        let tables = self.tables.read().await;
        let mut feedback: Vec<Feedback> = tables.feedback.iter().rev().cloned().collect();
        feedback.sort_by_key(|f| Reverse(f.created_at));
        Ok(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::auth::Role;

    fn at(hour: u32) -> (NaiveDate, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        )
    }

    async fn seed_doctor(store: &MemoryStore) -> (Account, DoctorProfile) {
        let account = AccountRepository::create(store, NewAccount {
            username: "dr.khan".to_string(),
            phone: "0300".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Doctor,
        }).await.unwrap();
        let doctor = DoctorRepository::create(store, NewDoctorProfile {
            account_id: account.id,
            specialty: "Cardiology".to_string(),
            fee: "PKR 1500".to_string(),
        }).await.unwrap();
        (account, doctor)
    }

    #[tokio::test]
    async fn claim_is_compare_and_set() {
        let store = MemoryStore::new();
        let (_, doctor) = seed_doctor(&store).await;
        let (date, time) = at(9);
        SlotRepository::create(&store, NewSlot { doctor_id: doctor.id, date, time }).await.unwrap();

        assert!(matches!(store.claim(doctor.id, date, time).await.unwrap(), SlotClaim::Claimed(_)));
        assert!(matches!(store.claim(doctor.id, date, time).await.unwrap(), SlotClaim::AlreadyBooked(_)));

        let (other_date, other_time) = at(11);
        assert_eq!(store.claim(doctor.id, other_date, other_time).await.unwrap(), SlotClaim::NoSlot);
    }

    #[tokio::test]
    async fn deleting_a_doctor_account_cascades_to_slots_and_appointments() {
        let store = MemoryStore::new();
        let (doctor_account, doctor) = seed_doctor(&store).await;
        let patient = AccountRepository::create(&store, NewAccount {
            username: "amina".to_string(),
            phone: "0311".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Patient,
        }).await.unwrap();
        let (date, time) = at(10);
        SlotRepository::create(&store, NewSlot { doctor_id: doctor.id, date, time }).await.unwrap();
        let appointment = AppointmentRepository::create(&store, NewAppointment {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date,
            time,
            reason: String::new(),
            status: AppointmentStatus::Confirmed,
        }).await.unwrap();
        BillRepository::create(&store, NewBill { appointment_id: appointment.id, amount: 1500 }).await.unwrap();

        assert!(AccountRepository::delete(&store, doctor_account.id).await.unwrap());

        assert!(SlotRepository::list(&store, None).await.unwrap().is_empty());
        assert_eq!(AppointmentRepository::count(&store).await.unwrap(), 0);
        assert!(BillRepository::list(&store, &BillFilter::default()).await.unwrap().is_empty());
        assert_eq!(AccountRepository::count(&store).await.unwrap(), 1);
    }
}
