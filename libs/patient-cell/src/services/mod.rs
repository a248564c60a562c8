pub mod feedback;
pub mod patient;
pub mod records;

pub use feedback::FeedbackService;
pub use patient::{resolve_patient_profile, PatientService};
pub use records::MedicalRecordService;
