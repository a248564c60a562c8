use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};
use shared_database::{AppState, MemoryStore, Repositories};
use shared_models::auth::{Role, User};
use shared_models::clinic::{
    Account, DoctorProfile, NewAccount, NewDoctorProfile, NewPatientProfile, NewSlot,
    PatientProfile, Slot,
};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_hours: 24,
            storage: StorageBackend::Memory,
            bind_addr: "127.0.0.1:0".parse().expect("static socket address"),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role,
        }
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(username, Role::Doctor)
    }

    pub fn patient(username: &str) -> Self {
        Self::new(username, Role::Patient)
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, Role::Admin)
    }

    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            role: account.role,
        }
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            issued_at: None,
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        issue_token(user.id, &user.username, user.role, secret, exp_hours.unwrap_or(24))
            .expect("test secret is non-empty")
            .token
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// In-memory clinic with helpers for seeding accounts, profiles and slots.
pub struct TestClinic {
    pub state: AppState,
    pub config: TestConfig,
}

impl Default for TestClinic {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClinic {
    pub fn new() -> Self {
        let config = TestConfig::default();
        let state = AppState::with_repositories(
            config.to_app_config(),
            Repositories::from_store(MemoryStore::new()),
        );
        Self { state, config }
    }

    pub fn repos(&self) -> &Repositories {
        &self.state.repos
    }

    pub async fn add_account(&self, username: &str, role: Role) -> Account {
        self.repos().accounts.create(NewAccount {
            username: username.to_string(),
            phone: "03001234567".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role,
        }).await.expect("seed account")
    }

    pub async fn add_patient(&self, username: &str) -> (Account, PatientProfile) {
        let account = self.add_account(username, Role::Patient).await;
        let profile = self.repos().patients.create(NewPatientProfile {
            account_id: account.id,
            gender: "female".to_string(),
            blood_group: "O+".to_string(),
        }).await.expect("seed patient profile");
        (account, profile)
    }

    pub async fn add_doctor(&self, username: &str, fee: &str) -> (Account, DoctorProfile) {
        let account = self.add_account(username, Role::Doctor).await;
        let profile = self.repos().doctors.create(NewDoctorProfile {
            account_id: account.id,
            specialty: "Cardiology".to_string(),
            fee: fee.to_string(),
        }).await.expect("seed doctor profile");
        (account, profile)
    }

    pub async fn add_admin(&self, username: &str) -> Account {
        self.add_account(username, Role::Admin).await
    }

    pub async fn add_slot(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> Slot {
        self.repos().slots.create(NewSlot { doctor_id, date, time })
            .await
            .expect("seed slot")
    }

    pub fn token_for(&self, account: &Account) -> String {
        JwtTestUtils::create_test_token(
            &TestUser::from_account(account),
            &self.config.jwt_secret,
            Some(1),
        )
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date")
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M:%S").expect("test time")
}

/// Builds a request with an optional bearer token and JSON body.
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("test request")
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("JSON response body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.storage, StorageBackend::Memory);
        assert!(!app_config.jwt_secret.is_empty());
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::doctor("dr.khan");
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(validate_token(&token, secret).unwrap().id, user.id);
        assert!(validate_token(&JwtTestUtils::create_expired_token(&user, secret), secret).is_err());
    }

    #[tokio::test]
    async fn test_clinic_seeds_profiles() {
        let clinic = TestClinic::new();
        let (account, doctor) = clinic.add_doctor("dr.khan", "PKR 1500").await;

        assert_eq!(doctor.account_id, account.id);
        assert_eq!(clinic.repos().doctors.count().await.unwrap(), 1);
    }
}
