use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use urlencoding::encode;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::clinic::{
    Account, AccountUpdate, Appointment, AppointmentFilter, AppointmentStatus, Bill, BillFilter,
    DoctorProfile, DoctorUpdate, Feedback, MedicalRecord, NewAccount, NewAppointment, NewBill,
    NewDoctorProfile, NewFeedback, NewMedicalRecord, NewPatientProfile, NewSlot, PatientProfile,
    Slot, SlotClaim,
};

use crate::repository::{
    AccountRepository, AppointmentRepository, BillRepository, DoctorRepository,
    FeedbackRepository, MedicalRecordRepository, PatientRepository, SlotRepository, StoreError,
    StoreResult,
};
use crate::supabase::{ApiError, SupabaseClient};

const ACCOUNTS: &str = "/rest/v1/accounts";
const PATIENTS: &str = "/rest/v1/patient_profiles";
const DOCTORS: &str = "/rest/v1/doctor_profiles";
const SLOTS: &str = "/rest/v1/doctor_slots";
const APPOINTMENTS: &str = "/rest/v1/appointments";
const BILLS: &str = "/rest/v1/bills";
const RECORDS: &str = "/rest/v1/medical_records";
const FEEDBACK: &str = "/rest/v1/feedback";

fn map_error(err: anyhow::Error) -> StoreError {
    match err.downcast_ref::<ApiError>() {
        Some(api) if api.status == 409 => StoreError::Conflict(api.body.clone()),
        Some(api) if api.status == 404 => StoreError::NotFound(api.body.clone()),
        _ => StoreError::Backend(err.to_string()),
    }
}

fn decode<T: DeserializeOwned>(rows: Vec<Value>) -> StoreResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| StoreError::Backend(e.to_string())))
        .collect()
}

fn slot_filter(doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> String {
    format!("doctor_id=eq.{}&date=eq.{}&time=eq.{}", doctor_id, date, time)
}

/// Repositories backed by Supabase's PostgREST interface. Cascades and
/// uniqueness come from `schema.sql`.
#[derive(Clone)]
pub struct SupabaseStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> StoreResult<Vec<T>> {
        let path = if query.is_empty() {
            format!("{}?select=*", table)
        } else {
            format!("{}?select=*&{}", table, query)
        };
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None)
            .await
            .map_err(map_error)?;
        decode(rows)
    }

    async fn select_one<T: DeserializeOwned>(&self, table: &str, query: &str) -> StoreResult<Option<T>> {
        Ok(self.select(table, query).await?.into_iter().next())
    }

    async fn insert<T: DeserializeOwned>(&self, table: &str, body: Value) -> StoreResult<T> {
        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            table,
            None,
            Some(body),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(map_error)?;

        decode(rows)?.into_iter().next()
            .ok_or_else(|| StoreError::Backend(format!("Insert into {} returned no rows", table)))
    }

    async fn patch<T: DeserializeOwned>(&self, table: &str, query: &str, body: Value) -> StoreResult<Vec<T>> {
        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &format!("{}?{}", table, query),
            None,
            Some(body),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(map_error)?;
        decode(rows)
    }

    async fn remove(&self, table: &str, query: &str) -> StoreResult<bool> {
        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &format!("{}?{}", table, query),
            None,
            None,
            Some(SupabaseClient::return_representation()),
        ).await.map_err(map_error)?;
        Ok(!rows.is_empty())
    }

    async fn count_rows(&self, table: &str) -> StoreResult<u64> {
        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &format!("{}?select=id", table),
            None,
            None,
        ).await.map_err(map_error)?;
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl AccountRepository for SupabaseStore {
    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        debug!("Creating account {}", account.username);
        self.insert(ACCOUNTS, json!({
            "username": account.username,
            "phone": account.phone,
            "password_hash": account.password_hash,
            "role": account.role,
        })).await.map_err(|e| match e {
            StoreError::Conflict(_) => StoreError::Conflict(format!("Username {} is already taken", account.username)),
            other => other,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        self.select_one(ACCOUNTS, &format!("id=eq.{}", id)).await
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        self.select_one(ACCOUNTS, &format!("username=eq.{}", encode(username))).await
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        self.select(ACCOUNTS, "order=created_at.desc").await
    }

    async fn update(&self, id: Uuid, update: AccountUpdate) -> StoreResult<Option<Account>> {
        let mut changes = Map::new();
        if let Some(username) = update.username {
            changes.insert("username".to_string(), json!(username));
        }
        if let Some(phone) = update.phone {
            changes.insert("phone".to_string(), json!(phone));
        }
        if let Some(password_hash) = update.password_hash {
            changes.insert("password_hash".to_string(), json!(password_hash));
        }
        if changes.is_empty() {
            return AccountRepository::find_by_id(self, id).await;
        }

        let rows = self.patch(ACCOUNTS, &format!("id=eq.{}", id), Value::Object(changes)).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.remove(ACCOUNTS, &format!("id=eq.{}", id)).await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.count_rows(ACCOUNTS).await
    }
}

#[async_trait]
impl PatientRepository for SupabaseStore {
    async fn create(&self, profile: NewPatientProfile) -> StoreResult<PatientProfile> {
        self.insert(PATIENTS, json!({
            "account_id": profile.account_id,
            "gender": profile.gender,
            "blood_group": profile.blood_group,
        })).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PatientProfile>> {
        self.select_one(PATIENTS, &format!("id=eq.{}", id)).await
    }

    async fn find_by_account(&self, account_id: Uuid) -> StoreResult<Option<PatientProfile>> {
        self.select_one(PATIENTS, &format!("account_id=eq.{}", account_id)).await
    }

    async fn list(&self) -> StoreResult<Vec<PatientProfile>> {
        self.select(PATIENTS, "").await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.count_rows(PATIENTS).await
    }
}

#[async_trait]
impl DoctorRepository for SupabaseStore {
    async fn create(&self, profile: NewDoctorProfile) -> StoreResult<DoctorProfile> {
        self.insert(DOCTORS, json!({
            "account_id": profile.account_id,
            "specialty": profile.specialty,
            "fee": profile.fee,
            "slots": [],
        })).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<DoctorProfile>> {
        self.select_one(DOCTORS, &format!("id=eq.{}", id)).await
    }

    async fn find_by_account(&self, account_id: Uuid) -> StoreResult<Option<DoctorProfile>> {
        self.select_one(DOCTORS, &format!("account_id=eq.{}", account_id)).await
    }

    async fn list(&self) -> StoreResult<Vec<DoctorProfile>> {
        self.select(DOCTORS, "").await
    }

    async fn update(&self, id: Uuid, update: DoctorUpdate) -> StoreResult<Option<DoctorProfile>> {
        let mut changes = Map::new();
        if let Some(specialty) = update.specialty {
            changes.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(fee) = update.fee {
            changes.insert("fee".to_string(), json!(fee));
        }
        if changes.is_empty() {
            return DoctorRepository::find_by_id(self, id).await;
        }

        let rows = self.patch(DOCTORS, &format!("id=eq.{}", id), Value::Object(changes)).await?;
        Ok(rows.into_iter().next())
    }

    async fn count(&self) -> StoreResult<u64> {
        self.count_rows(DOCTORS).await
    }
}

#[async_trait]
impl SlotRepository for SupabaseStore {
    async fn create(&self, slot: NewSlot) -> StoreResult<Slot> {
        self.insert(SLOTS, json!({
            "doctor_id": slot.doctor_id,
            "date": slot.date,
            "time": slot.time,
            "is_booked": false,
        })).await.map_err(|e| match e {
            StoreError::Conflict(_) => StoreError::Conflict(format!(
                "Slot {} {} already exists for this doctor", slot.date, slot.time
            )),
            other => other,
        })
    }

    async fn list(&self, doctor_id: Option<Uuid>) -> StoreResult<Vec<Slot>> {
        let query = match doctor_id {
            Some(id) => format!("doctor_id=eq.{}&order=date.desc,time.desc", id),
            None => "order=date.desc,time.desc".to_string(),
        };
        self.select(SLOTS, &query).await
    }

    async fn list_available(&self, doctor_id: Uuid) -> StoreResult<Vec<Slot>> {
        self.select(
            SLOTS,
            &format!("doctor_id=eq.{}&is_booked=eq.false&order=date.desc,time.desc", doctor_id),
        ).await
    }

    async fn find(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> StoreResult<Option<Slot>> {
        self.select_one(SLOTS, &slot_filter(doctor_id, date, time)).await
    }

    async fn claim(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> StoreResult<SlotClaim> {
        // The is_booked filter makes the update conditional, so two concurrent
        // claims cannot both succeed.
        let query = format!("{}&is_booked=eq.false", slot_filter(doctor_id, date, time));
        let claimed: Vec<Slot> = self.patch(SLOTS, &query, json!({ "is_booked": true })).await?;
        if let Some(slot) = claimed.into_iter().next() {
            return Ok(SlotClaim::Claimed(slot));
        }

        match SlotRepository::find(self, doctor_id, date, time).await? {
            Some(slot) => {
                warn!("Slot {} {} for doctor {} is already booked", date, time, doctor_id);
                Ok(SlotClaim::AlreadyBooked(slot))
            }
            None => Ok(SlotClaim::NoSlot),
        }
    }

    async fn release(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> StoreResult<Option<Slot>> {
        let released: Vec<Slot> = self.patch(
            SLOTS,
            &slot_filter(doctor_id, date, time),
            json!({ "is_booked": false }),
        ).await?;
        Ok(released.into_iter().next())
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseStore {
    async fn create(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        self.insert(APPOINTMENTS, json!({
            "patient_id": appointment.patient_id,
            "doctor_id": appointment.doctor_id,
            "date": appointment.date,
            "time": appointment.time,
            "reason": appointment.reason,
            "status": appointment.status,
        })).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        self.select_one(APPOINTMENTS, &format!("id=eq.{}", id)).await
    }

    async fn list(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let mut query_parts = Vec::new();
        if let Some(patient_id) = filter.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(doctor_id) = filter.doctor_id {
            query_parts.push(format!("doctor_id=eq.{}", doctor_id));
        }
        if let Some(status) = &filter.status {
            query_parts.push(format!("status=eq.{}", encode(status.as_str())));
        }
        if let Some(date) = filter.date {
            query_parts.push(format!("date=eq.{}", date));
        }
        if let Some(time) = filter.time {
            query_parts.push(format!("time=eq.{}", time));
        }
        query_parts.push("order=date.desc,time.desc".to_string());

        self.select(APPOINTMENTS, &query_parts.join("&")).await
    }

    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> StoreResult<Option<Appointment>> {
        let rows = self.patch(
            APPOINTMENTS,
            &format!("id=eq.{}", id),
            json!({ "status": status }),
        ).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.remove(APPOINTMENTS, &format!("id=eq.{}", id)).await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.count_rows(APPOINTMENTS).await
    }
}

#[async_trait]
impl BillRepository for SupabaseStore {
    async fn create(&self, bill: NewBill) -> StoreResult<Bill> {
        self.insert(BILLS, json!({
            "appointment_id": bill.appointment_id,
            "amount": bill.amount,
            "status": "unpaid",
        })).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Bill>> {
        self.select_one(BILLS, &format!("id=eq.{}", id)).await
    }

    async fn find_by_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Bill>> {
        self.select_one(BILLS, &format!("appointment_id=eq.{}", appointment_id)).await
    }

    async fn list(&self, filter: &BillFilter) -> StoreResult<Vec<Bill>> {
        let mut query_parts = Vec::new();
        if let Some(status) = filter.status {
            query_parts.push(format!("status=eq.{}", status.as_str()));
        }
        query_parts.push("order=created_at.desc".to_string());

        let Some(patient_id) = filter.patient_id else {
            return self.select(BILLS, &query_parts.join("&")).await;
        };

        // Inner-join the owning appointment to filter by its patient.
        let path = format!(
            "{}?select=*,appointments!inner(patient_id)&appointments.patient_id=eq.{}&{}",
            BILLS, patient_id, query_parts.join("&")
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None)
            .await
            .map_err(map_error)?;
        decode(rows)
    }

    async fn mark_paid(&self, id: Uuid) -> StoreResult<Option<Bill>> {
        let rows = self.patch(BILLS, &format!("id=eq.{}", id), json!({ "status": "paid" })).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl MedicalRecordRepository for SupabaseStore {
    async fn create(&self, record: NewMedicalRecord) -> StoreResult<MedicalRecord> {
        self.insert(RECORDS, json!({
            "patient_id": record.patient_id,
            "doctor_id": record.doctor_id,
            "diagnosis": record.diagnosis,
            "prescription": record.prescription,
            "notes": record.notes,
            "tests": record.tests,
        })).await
    }

    async fn list(&self, patient_id: Option<Uuid>) -> StoreResult<Vec<MedicalRecord>> {
        let query = match patient_id {
            Some(id) => format!("patient_id=eq.{}&order=date.desc", id),
            None => "order=date.desc".to_string(),
        };
        self.select(RECORDS, &query).await
    }
}

#[async_trait]
impl FeedbackRepository for SupabaseStore {
    async fn create(&self, feedback: NewFeedback) -> StoreResult<Feedback> {
        self.insert(FEEDBACK, json!({
            "patient_id": feedback.patient_id,
            "content": feedback.content,
        })).await
    }

    async fn list(&self) -> StoreResult<Vec<Feedback>> {
        self.select(FEEDBACK, "order=created_at.desc").await
    }
}
