pub mod reporting;
pub mod users;

pub use reporting::ReportingService;
pub use users::UserAdminService;
