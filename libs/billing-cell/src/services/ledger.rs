// libs/billing-cell/src/services/ledger.rs
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::repository::BillRepository;
use shared_database::Repositories;
use shared_models::clinic::{Bill, BillFilter, BillStatus};

use crate::models::{BillingError, FeeParseError, FALLBACK_BILL_AMOUNT};

fn digit_run() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"))
}

/// First run of ASCII digits in a display fee such as "PKR 1500".
pub fn parse_fee_amount(fee: &str) -> Result<i64, FeeParseError> {
    let digits = digit_run()
        .find(fee)
        .ok_or(FeeParseError::NoDigits)?
        .as_str();

    digits
        .parse::<i64>()
        .map_err(|_| FeeParseError::OutOfRange(digits.to_string()))
}

pub fn bill_amount_for_fee(fee: &str) -> i64 {
    match parse_fee_amount(fee) {
        Ok(amount) => amount,
        Err(e) => {
            warn!("Fee '{}' not billable ({}), charging {}", fee, e, FALLBACK_BILL_AMOUNT);
            FALLBACK_BILL_AMOUNT
        }
    }
}

pub struct BillingService {
    bills: Arc<dyn BillRepository>,
}

impl BillingService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            bills: Arc::clone(&repos.bills),
        }
    }

    /// Marks the bill paid. Paying a paid bill returns it unchanged.
    pub async fn pay_bill(&self, bill_id: Uuid) -> Result<Bill, BillingError> {
        let bill = self.bills
            .find_by_id(bill_id)
            .await?
            .ok_or(BillingError::NotFound)?;

        if bill.status == BillStatus::Paid {
            debug!("Bill {} already paid", bill_id);
            return Ok(bill);
        }

        let paid = self.bills
            .mark_paid(bill_id)
            .await?
            .ok_or(BillingError::NotFound)?;

        info!("Bill {} paid ({})", paid.id, paid.amount);
        Ok(paid)
    }

    pub async fn list_bills(&self, patient_id: Option<Uuid>) -> Result<Vec<Bill>, BillingError> {
        let bills = self.bills
            .list(&BillFilter { patient_id, status: None })
            .await?;
        Ok(bills)
    }

    /// Sum of paid bill amounts, recomputed on every call.
    pub async fn total_revenue(&self) -> Result<i64, BillingError> {
        let paid = self.bills
            .list(&BillFilter { patient_id: None, status: Some(BillStatus::Paid) })
            .await?;
        Ok(paid.iter().map(|bill| bill.amount).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_first_number_in_the_fee() {
        assert_eq!(parse_fee_amount("PKR 1500"), Ok(1500));
        assert_eq!(parse_fee_amount("1200-1500 per visit"), Ok(1200));
        assert_eq!(parse_fee_amount("Rs.800/-"), Ok(800));
    }

    #[test]
    fn reports_why_a_fee_is_not_billable() {
        assert_eq!(parse_fee_amount("Free"), Err(FeeParseError::NoDigits));
        assert_eq!(
            parse_fee_amount("PKR 99999999999999999999"),
            Err(FeeParseError::OutOfRange("99999999999999999999".to_string()))
        );
    }

    #[test]
    fn non_ascii_digits_are_ignored() {
        assert_eq!(parse_fee_amount("٣٠٠"), Err(FeeParseError::NoDigits));
    }

    #[test]
    fn unbillable_fees_fall_back() {
        assert_eq!(bill_amount_for_fee("PKR 1500"), 1500);
        assert_eq!(bill_amount_for_fee("Free"), FALLBACK_BILL_AMOUNT);
        assert_eq!(bill_amount_for_fee(""), FALLBACK_BILL_AMOUNT);
    }
}
