// libs/admin-cell/src/services/reporting.rs
use tracing::debug;

use billing_cell::BillingService;
use shared_database::Repositories;

use crate::models::{AdminError, AdminStats};

/// Read-only aggregates, recomputed on every call.
pub struct ReportingService {
    repos: Repositories,
}

impl ReportingService {
    pub fn new(repos: &Repositories) -> Self {
        Self { repos: repos.clone() }
    }

    pub async fn stats(&self) -> Result<AdminStats, AdminError> {
        let stats = AdminStats {
            total_users: self.repos.accounts.count().await?,
            total_doctors: self.repos.doctors.count().await?,
            total_patients: self.repos.patients.count().await?,
            total_appointments: self.repos.appointments.count().await?,
            total_revenue: BillingService::new(&self.repos).total_revenue().await?,
        };
        debug!("Computed admin stats: {:?}", stats);
        Ok(stats)
    }
}
