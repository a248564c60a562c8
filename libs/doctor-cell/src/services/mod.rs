pub mod doctor;
pub mod slots;

pub use doctor::{resolve_doctor, DoctorService};
pub use slots::SlotService;
