// libs/shared/models/src/clinic.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;

// ==============================================================================
// ACCOUNTS AND PROFILES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.phone.is_none() && self.password_hash.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub gender: String,
    pub blood_group: String,
}

#[derive(Debug, Clone)]
pub struct NewPatientProfile {
    pub account_id: Uuid,
    pub gender: String,
    pub blood_group: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub specialty: String,
    /// Display price such as "PKR 1500"; bills take the first number in it.
    pub fee: String,
    /// Ad-hoc slot labels from before slots were tracked individually.
    #[serde(default)]
    pub slots: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewDoctorProfile {
    pub account_id: Uuid,
    pub specialty: String,
    pub fee: String,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorUpdate {
    pub specialty: Option<String>,
    pub fee: Option<String>,
}

/// Doctor profile joined with the owning account's public fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDetails {
    #[serde(flatten)]
    pub profile: DoctorProfile,
    pub username: String,
    pub phone: String,
}

/// Patient profile joined with the owning account's public fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetails {
    #[serde(flatten)]
    pub profile: PatientProfile,
    pub username: String,
    pub phone: String,
}

// ==============================================================================
// SLOTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub is_booked: bool,
}

#[derive(Debug, Clone)]
pub struct NewSlot {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Outcome of trying to flip a slot from free to booked.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotClaim {
    Claimed(Slot),
    AlreadyBooked(Slot),
    NoSlot,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

/// Appointment status. The workflow knows three states; admins may store any
/// other label, which is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    Confirmed,
    Completed,
    Cancelled,
    Other(String),
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Other(label) => label,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled)
    }
}

impl From<String> for AppointmentStatus {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "confirmed" => AppointmentStatus::Confirmed,
            "completed" => AppointmentStatus::Completed,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Other(trimmed.to_string()),
        }
    }
}

impl From<&str> for AppointmentStatus {
    fn from(raw: &str) -> Self {
        AppointmentStatus::from(raw.to_string())
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    /// Account id of the patient.
    pub patient_id: Uuid,
    /// Doctor profile id.
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub reason: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_active(&self) -> bool {
        !self.status.is_cancelled()
    }
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl AppointmentFilter {
    pub fn for_patient(patient_id: Uuid) -> Self {
        Self { patient_id: Some(patient_id), ..Default::default() }
    }

    pub fn for_doctor(doctor_id: Uuid) -> Self {
        Self { doctor_id: Some(doctor_id), ..Default::default() }
    }

    pub fn at(doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            date: Some(date),
            time: Some(time),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: AppointmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
            && self.status.as_ref().map_or(true, |status| &appointment.status == status)
            && self.date.map_or(true, |date| appointment.date == date)
            && self.time.map_or(true, |time| appointment.time == time)
    }
}

// ==============================================================================
// BILLING
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Paid,
    Unpaid,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Paid => "paid",
            BillStatus::Unpaid => "unpaid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub appointment_id: Uuid,
    /// Whole currency units.
    pub amount: i64,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBill {
    pub appointment_id: Uuid,
    pub amount: i64,
}

#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    /// Account id of the patient owning the bill's appointment.
    pub patient_id: Option<Uuid>,
    pub status: Option<BillStatus>,
}

// ==============================================================================
// MEDICAL RECORDS AND FEEDBACK
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: Uuid,
    /// Patient profile id.
    pub patient_id: Uuid,
    /// Doctor profile id.
    pub doctor_id: Uuid,
    pub diagnosis: String,
    pub prescription: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tests: Vec<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewMedicalRecord {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: String,
    pub prescription: String,
    pub notes: String,
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    /// Account id of the patient.
    pub patient_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub patient_id: Uuid,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_round_trips_known_and_free_text_labels() {
        let known: AppointmentStatus = serde_json::from_value(json!("Cancelled")).unwrap();
        assert_eq!(known, AppointmentStatus::Cancelled);

        let other: AppointmentStatus = serde_json::from_value(json!("no-show")).unwrap();
        assert_eq!(other, AppointmentStatus::Other("no-show".to_string()));
        assert_eq!(serde_json::to_value(&other).unwrap(), json!("no-show"));
        assert_eq!(serde_json::to_value(AppointmentStatus::Confirmed).unwrap(), json!("confirmed"));
    }

    #[test]
    fn account_serialization_hides_password_hash() {
        let account = Account {
            id: Uuid::new_v4(),
            username: "amina".to_string(),
            phone: "0300".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Patient,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&account).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], "patient");
    }

    #[test]
    fn filter_matches_slot_coordinates() {
        let doctor_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id,
            date,
            time,
            reason: String::new(),
            status: AppointmentStatus::Confirmed,
            created_at: Utc::now(),
        };

        assert!(AppointmentFilter::at(doctor_id, date, time).matches(&appointment));
        assert!(!AppointmentFilter::at(Uuid::new_v4(), date, time).matches(&appointment));
        assert!(!AppointmentFilter::for_doctor(doctor_id)
            .with_status(AppointmentStatus::Completed)
            .matches(&appointment));
    }
}
