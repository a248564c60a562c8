pub mod ledger;

pub use ledger::BillingService;
