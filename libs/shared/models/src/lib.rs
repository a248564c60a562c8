pub mod auth;
pub mod clinic;
pub mod clock;
pub mod error;
