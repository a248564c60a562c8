// libs/patient-cell/src/services/feedback.rs
use std::sync::Arc;

use tracing::info;

use shared_database::repository::{AccountRepository, FeedbackRepository, PatientRepository};
use shared_database::Repositories;
use shared_models::clinic::{Feedback, NewFeedback};

use crate::models::{FeedbackRequest, PatientError};

pub struct FeedbackService {
    accounts: Arc<dyn AccountRepository>,
    patients: Arc<dyn PatientRepository>,
    feedback: Arc<dyn FeedbackRepository>,
}

impl FeedbackService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            accounts: Arc::clone(&repos.accounts),
            patients: Arc::clone(&repos.patients),
            feedback: Arc::clone(&repos.feedback),
        }
    }

    /// Stores feedback against the patient's account. A patient profile id
    /// is accepted as well.
    pub async fn submit(&self, request: FeedbackRequest) -> Result<Feedback, PatientError> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(PatientError::Validation("Feedback content is required".to_string()));
        }

        let account_id = match self.accounts.find_by_id(request.patient_id).await? {
            Some(account) => account.id,
            None => self.patients
                .find_by_id(request.patient_id)
                .await?
                .ok_or(PatientError::NotFound)?
                .account_id,
        };

        let feedback = self.feedback.create(NewFeedback {
            patient_id: account_id,
            content: content.to_string(),
        }).await?;

        info!("Feedback {} received from {}", feedback.id, account_id);
        Ok(feedback)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Feedback>, PatientError> {
        Ok(self.feedback.list().await?)
    }
}
