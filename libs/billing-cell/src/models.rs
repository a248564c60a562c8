// libs/billing-cell/src/models.rs
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;

/// Charged when a doctor's fee string carries no usable number.
pub const FALLBACK_BILL_AMOUNT: i64 = 2000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillQuery {
    /// Patient account id.
    pub patient_id: Option<Uuid>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeParseError {
    #[error("fee contains no digits")]
    NoDigits,

    #[error("fee amount {0} is out of range")]
    OutOfRange(String),
}

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Bill not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::NotFound => AppError::NotFound(err.to_string()),
            BillingError::Store(store) => store.into(),
        }
    }
}
