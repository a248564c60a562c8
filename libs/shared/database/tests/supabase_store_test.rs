// libs/shared/database/tests/supabase_store_test.rs
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::{AppConfig, StorageBackend};
use shared_database::repository::{AccountRepository, BillRepository, SlotRepository};
use shared_database::{StoreError, SupabaseStore};
use shared_models::clinic::{BillFilter, NewAccount, NewSlot, SlotClaim};
use shared_models::auth::Role;

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
        token_ttl_hours: 24,
        storage: StorageBackend::Supabase,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    }
}

fn slot_row(id: Uuid, doctor_id: Uuid, is_booked: bool) -> serde_json::Value {
    json!({
        "id": id,
        "doctor_id": doctor_id,
        "date": "2025-05-10",
        "time": "10:00:00",
        "is_booked": is_booked
    })
}

fn coordinates() -> (NaiveDate, NaiveTime) {
    (
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn test_claim_uses_conditional_update() {
    let mock_server = MockServer::start().await;
    let store = SupabaseStore::new(&config_for(&mock_server));
    let doctor_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4();
    let (date, time) = coordinates();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_slots"))
        .and(query_param("is_booked", "eq.false"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(header("Prefer", "return=representation"))
        .and(body_json(json!({ "is_booked": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            slot_row(slot_id, doctor_id, true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let claim = store.claim(doctor_id, date, time).await.unwrap();
    assert_matches!(claim, SlotClaim::Claimed(slot) if slot.id == slot_id && slot.is_booked);
}

#[tokio::test]
async fn test_claim_reports_booked_slot_when_update_matches_nothing() {
    let mock_server = MockServer::start().await;
    let store = SupabaseStore::new(&config_for(&mock_server));
    let doctor_id = Uuid::new_v4();
    let (date, time) = coordinates();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_slots"))
        .and(query_param("time", "eq.10:00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            slot_row(Uuid::new_v4(), doctor_id, true)
        ])))
        .mount(&mock_server)
        .await;

    let claim = store.claim(doctor_id, date, time).await.unwrap();
    assert_matches!(claim, SlotClaim::AlreadyBooked(_));
}

#[tokio::test]
async fn test_claim_without_declared_slot() {
    let mock_server = MockServer::start().await;
    let store = SupabaseStore::new(&config_for(&mock_server));
    let (date, time) = coordinates();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let claim = store.claim(Uuid::new_v4(), date, time).await.unwrap();
    assert_eq!(claim, SlotClaim::NoSlot);
}

#[tokio::test]
async fn test_duplicate_slot_maps_to_conflict() {
    let mock_server = MockServer::start().await;
    let store = SupabaseStore::new(&config_for(&mock_server));
    let (date, time) = coordinates();

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_slots"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&mock_server)
        .await;

    let result = SlotRepository::create(&store, NewSlot { doctor_id: Uuid::new_v4(), date, time }).await;
    assert_matches!(result, Err(StoreError::Conflict(msg)) if msg.contains("already exists"));
}

#[tokio::test]
async fn test_duplicate_username_maps_to_conflict() {
    let mock_server = MockServer::start().await;
    let store = SupabaseStore::new(&config_for(&mock_server));

    Mock::given(method("POST"))
        .and(path("/rest/v1/accounts"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
        .mount(&mock_server)
        .await;

    let result = AccountRepository::create(&store, NewAccount {
        username: "amina".to_string(),
        phone: "0300".to_string(),
        password_hash: "hash".to_string(),
        role: Role::Patient,
    }).await;
    assert_matches!(result, Err(StoreError::Conflict(msg)) if msg.contains("amina"));
}

#[tokio::test]
async fn test_bills_for_patient_join_appointments() {
    let mock_server = MockServer::start().await;
    let store = SupabaseStore::new(&config_for(&mock_server));
    let patient_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bills"))
        .and(query_param("appointments.patient_id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "appointment_id": appointment_id,
            "amount": 1500,
            "status": "unpaid",
            "created_at": Utc::now().to_rfc3339(),
            "appointments": { "patient_id": patient_id }
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bills = BillRepository::list(&store, &BillFilter {
        patient_id: Some(patient_id),
        status: None,
    }).await.unwrap();

    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].appointment_id, appointment_id);
    assert_eq!(bills[0].amount, 1500);
}

#[tokio::test]
async fn test_backend_failure_is_not_a_conflict() {
    let mock_server = MockServer::start().await;
    let store = SupabaseStore::new(&config_for(&mock_server));

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let result = store.find_by_username("amina").await;
    assert_matches!(result, Err(StoreError::Backend(_)));
}
