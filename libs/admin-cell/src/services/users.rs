// libs/admin-cell/src/services/users.rs
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use appointment_cell::AppointmentBookingService;
use auth_cell::services::account::validate_phone;
use auth_cell::{AccountService, PasswordService, SignupOutcome, SignupRequest};
use shared_database::repository::AccountRepository;
use shared_database::Repositories;
use shared_models::auth::Role;
use shared_models::clinic::{Account, AccountUpdate};

use crate::models::{AdminError, UpdateUserRequest};

pub struct UserAdminService {
    repos: Repositories,
    accounts: Arc<dyn AccountRepository>,
}

impl UserAdminService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            repos: repos.clone(),
            accounts: Arc::clone(&repos.accounts),
        }
    }

    /// Newest first.
    pub async fn list_users(&self) -> Result<Vec<Account>, AdminError> {
        Ok(self.accounts.list().await?)
    }

    pub async fn create_user(&self, request: SignupRequest) -> Result<SignupOutcome, AdminError> {
        let outcome = AccountService::new(&self.repos).signup(request).await?;
        info!("Admin created {} account {}", outcome.account.role, outcome.account.id);
        Ok(outcome)
    }

    pub async fn update_user(&self, id: Uuid, request: UpdateUserRequest) -> Result<Account, AdminError> {
        let mut update = AccountUpdate::default();

        if let Some(username) = request.username {
            let username = username.trim();
            if username.is_empty() {
                return Err(AdminError::Validation("Username cannot be empty".to_string()));
            }
            update.username = Some(username.to_string());
        }
        if let Some(phone) = request.phone {
            let phone = phone.trim();
            validate_phone(phone)?;
            update.phone = Some(phone.to_string());
        }
        if let Some(password) = request.password {
            if password.is_empty() {
                return Err(AdminError::Validation("Password cannot be empty".to_string()));
            }
            update.password_hash = Some(
                PasswordService::hash_password(&password).map_err(auth_cell::AccountError::from)?,
            );
        }

        if update.is_empty() {
            return Err(AdminError::Validation("No fields to update".to_string()));
        }

        let account = self.accounts
            .update(id, update)
            .await?
            .ok_or(AdminError::UserNotFound)?;

        info!("Admin updated account {}", account.id);
        Ok(account)
    }

    /// Deletes the account and everything it owns. A patient's booked slots
    /// are freed first so other patients can take them.
    pub async fn delete_user(&self, id: Uuid) -> Result<(), AdminError> {
        let account = self.accounts
            .find_by_id(id)
            .await?
            .ok_or(AdminError::UserNotFound)?;

        if account.role == Role::Patient {
            AppointmentBookingService::new(&self.repos)
                .release_slots_for_patient(account.id)
                .await?;
        }

        if !self.accounts.delete(id).await? {
            return Err(AdminError::UserNotFound);
        }

        info!("Admin deleted {} account {}", account.role, id);
        Ok(())
    }
}
