// libs/auth-cell/src/services/account.rs
use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::repository::{AccountRepository, DoctorRepository, PatientRepository};
use shared_database::Repositories;
use shared_models::auth::Role;
use shared_models::clinic::{Account, NewAccount, NewDoctorProfile, NewPatientProfile};
use shared_utils::jwt::issue_token;

use crate::models::{
    AccountError, LoginRequest, LoginResponse, SignupOutcome, SignupProfile, SignupRequest,
    DEFAULT_FEE, DEFAULT_SPECIALTY, MAX_PHONE_LEN,
};
use crate::services::password::PasswordService;

pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    patients: Arc<dyn PatientRepository>,
    doctors: Arc<dyn DoctorRepository>,
}

impl AccountService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            accounts: Arc::clone(&repos.accounts),
            patients: Arc::clone(&repos.patients),
            doctors: Arc::clone(&repos.doctors),
        }
    }

    /// Self-service signup. Admin accounts can only be self-registered while
    /// the clinic has no admin yet; after that they come from `/admin/users`.
    pub async fn register(&self, request: SignupRequest) -> Result<SignupOutcome, AccountError> {
        if let SignupProfile::Admin = request.profile {
            let admins = self.accounts
                .list()
                .await?
                .into_iter()
                .filter(|a| a.role == Role::Admin)
                .count();
            if admins > 0 {
                warn!("Rejected public admin signup for {}", request.username.trim());
                return Err(AccountError::Forbidden(
                    "Admin accounts must be created by an existing admin".to_string(),
                ));
            }
        }
        self.signup(request).await
    }

    /// Creates the account and its role profile. If the profile cannot be
    /// written the account is removed again.
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupOutcome, AccountError> {
        let username = request.username.trim().to_string();
        let phone = request.phone.trim().to_string();
        validate_credentials(&username, &request.password, &phone)?;

        if let SignupProfile::Patient { gender, blood_group } = &request.profile {
            if gender.trim().is_empty() || blood_group.trim().is_empty() {
                return Err(AccountError::Validation(
                    "Gender and blood group are required for patients".to_string(),
                ));
            }
        }

        let role = request.profile.role();
        let password_hash = PasswordService::hash_password(&request.password)?;

        let account = self.accounts.create(NewAccount {
            username,
            phone,
            password_hash,
            role,
        }).await?;

        match self.create_profile(&account, request.profile).await {
            Ok(outcome) => {
                info!("Registered {} account {}", role, account.id);
                Ok(outcome)
            }
            Err(err) => {
                warn!("Profile creation failed for account {}: {}", account.id, err);
                if let Err(cleanup) = self.accounts.delete(account.id).await {
                    warn!("Could not remove orphaned account {}: {}", account.id, cleanup);
                }
                Err(err)
            }
        }
    }

    async fn create_profile(
        &self,
        account: &Account,
        profile: SignupProfile,
    ) -> Result<SignupOutcome, AccountError> {
        let mut outcome = SignupOutcome {
            account: account.clone(),
            patient: None,
            doctor: None,
        };

        match profile {
            SignupProfile::Patient { gender, blood_group } => {
                outcome.patient = Some(self.patients.create(NewPatientProfile {
                    account_id: account.id,
                    gender: gender.trim().to_string(),
                    blood_group: blood_group.trim().to_string(),
                }).await?);
            }
            SignupProfile::Doctor { specialty, fee } => {
                outcome.doctor = Some(self.doctors.create(NewDoctorProfile {
                    account_id: account.id,
                    specialty: non_blank(specialty).unwrap_or_else(|| DEFAULT_SPECIALTY.to_string()),
                    fee: non_blank(fee).unwrap_or_else(|| DEFAULT_FEE.to_string()),
                }).await?);
            }
            SignupProfile::Admin => {}
        }

        Ok(outcome)
    }

    /// Verifies the password and issues a signed token carrying the role.
    pub async fn login(
        &self,
        request: LoginRequest,
        config: &AppConfig,
    ) -> Result<LoginResponse, AccountError> {
        let (username, password) = match (request.username, request.password) {
            (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => (u, p),
            _ => return Err(AccountError::MissingCredentials),
        };

        let account = self.accounts
            .find_by_username(username.trim())
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        // A stored hash that does not parse counts as a failed login.
        let verified = PasswordService::verify_password(&password, &account.password_hash)
            .unwrap_or_else(|e| {
                warn!("Unreadable password hash for account {}: {}", account.id, e);
                false
            });
        if !verified {
            debug!("Password mismatch for {}", account.username);
            return Err(AccountError::InvalidCredentials);
        }

        let issued = issue_token(
            account.id,
            &account.username,
            account.role,
            &config.jwt_secret,
            config.token_ttl_hours,
        ).map_err(AccountError::Token)?;

        let (patient_id, doctor_id) = match account.role {
            Role::Patient => (
                self.patients.find_by_account(account.id).await?.map(|p| p.id),
                None,
            ),
            Role::Doctor => (
                None,
                self.doctors.find_by_account(account.id).await?.map(|d| d.id),
            ),
            Role::Admin => (None, None),
        };

        info!("{} logged in as {}", account.username, account.role);
        Ok(LoginResponse {
            username: account.username,
            role: account.role,
            token: issued.token,
            expires_at: issued.expires_at,
            user_id: account.id,
            patient_id,
            doctor_id,
        })
    }
}

pub fn validate_credentials(username: &str, password: &str, phone: &str) -> Result<(), AccountError> {
    if username.is_empty() || password.is_empty() || phone.is_empty() {
        return Err(AccountError::Validation(
            "Username, password and phone are required".to_string(),
        ));
    }
    validate_phone(phone)
}

pub fn validate_phone(phone: &str) -> Result<(), AccountError> {
    if phone.chars().count() > MAX_PHONE_LEN {
        return Err(AccountError::Validation(format!(
            "Phone number must be at most {} characters",
            MAX_PHONE_LEN
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_database::StoreError;
    use shared_utils::test_utils::TestClinic;

    fn signup(username: &str, profile: SignupProfile) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: "s3cret-pass".to_string(),
            phone: "03001234567".to_string(),
            profile,
        }
    }

    #[tokio::test]
    async fn doctor_signup_applies_defaults() {
        let clinic = TestClinic::new();
        let service = AccountService::new(clinic.repos());

        let outcome = service.signup(signup("dr.khan", SignupProfile::Doctor {
            specialty: None,
            fee: Some("  ".to_string()),
        })).await.unwrap();

        let doctor = outcome.doctor.unwrap();
        assert_eq!(doctor.specialty, DEFAULT_SPECIALTY);
        assert_eq!(doctor.fee, DEFAULT_FEE);
        assert_eq!(outcome.account.role, Role::Doctor);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let clinic = TestClinic::new();
        let service = AccountService::new(clinic.repos());
        service.signup(signup("amina", SignupProfile::Admin)).await.unwrap();

        let result = service.signup(signup("amina", SignupProfile::Admin)).await;
        assert_matches!(result, Err(AccountError::Store(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn long_phone_is_rejected_before_anything_is_stored() {
        let clinic = TestClinic::new();
        let service = AccountService::new(clinic.repos());
        let mut request = signup("amina", SignupProfile::Admin);
        request.phone = "0".repeat(MAX_PHONE_LEN + 1);

        assert_matches!(service.signup(request).await, Err(AccountError::Validation(_)));
        assert_eq!(clinic.repos().accounts.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn login_returns_profile_id_and_valid_token() {
        let clinic = TestClinic::new();
        let service = AccountService::new(clinic.repos());
        let outcome = service.signup(signup("amina", SignupProfile::Patient {
            gender: "female".to_string(),
            blood_group: "B+".to_string(),
        })).await.unwrap();

        let config = clinic.config.to_app_config();
        let response = service.login(LoginRequest {
            username: Some("amina".to_string()),
            password: Some("s3cret-pass".to_string()),
        }, &config).await.unwrap();

        assert_eq!(response.user_id, outcome.account.id);
        assert_eq!(response.patient_id, outcome.patient_id());
        assert_eq!(response.doctor_id, None);
        let user = shared_utils::jwt::validate_token(&response.token, &config.jwt_secret).unwrap();
        assert_eq!(user.role, Role::Patient);
    }

    #[tokio::test]
    async fn login_failures_are_distinguished() {
        let clinic = TestClinic::new();
        let service = AccountService::new(clinic.repos());
        service.signup(signup("amina", SignupProfile::Admin)).await.unwrap();
        let config = clinic.config.to_app_config();

        let missing = service.login(LoginRequest {
            username: Some("amina".to_string()),
            password: None,
        }, &config).await;
        assert_matches!(missing, Err(AccountError::MissingCredentials));

        let wrong = service.login(LoginRequest {
            username: Some("amina".to_string()),
            password: Some("nope".to_string()),
        }, &config).await;
        assert_matches!(wrong, Err(AccountError::InvalidCredentials));

        let unknown = service.login(LoginRequest {
            username: Some("ghost".to_string()),
            password: Some("s3cret-pass".to_string()),
        }, &config).await;
        assert_matches!(unknown, Err(AccountError::InvalidCredentials));
    }
}
