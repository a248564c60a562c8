pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::ledger::{bill_amount_for_fee, parse_fee_amount, BillingService};
