// libs/auth-cell/tests/integration_test.rs
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use auth_cell::router::auth_routes;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{json_request, response_json, TestClinic};

#[tokio::test]
async fn test_patient_signup_then_login() {
    let clinic = TestClinic::new();
    let app = auth_routes(clinic.state.clone());

    let response = app.clone()
        .oneshot(json_request("POST", "/signup", None, Some(json!({
            "username": "amina",
            "password": "s3cret-pass",
            "phone": "03001234567",
            "category": "patient",
            "gender": "female",
            "blood_group": "A+"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["message"], "User created successfully");
    assert!(created["patient_id"].is_string());

    let response = app
        .oneshot(json_request("POST", "/login", None, Some(json!({
            "username": "amina",
            "password": "s3cret-pass"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["role"], "patient");
    assert_eq!(body["user_id"], created["user_id"]);
    assert_eq!(body["patient_id"], created["patient_id"]);

    let token = body["token"].as_str().unwrap();
    let user = validate_token(token, &clinic.config.jwt_secret).unwrap();
    assert_eq!(user.username, "amina");
}

#[tokio::test]
async fn test_doctor_signup_returns_doctor_id() {
    let clinic = TestClinic::new();
    let app = auth_routes(clinic.state.clone());

    let response = app
        .oneshot(json_request("POST", "/signup", None, Some(json!({
            "username": "dr.khan",
            "password": "s3cret-pass",
            "phone": "03001234567",
            "category": "doctor",
            "specialty": "Dermatology",
            "fee": "PKR 1800"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert!(body["doctor_id"].is_string());
    assert!(body.get("patient_id").is_none());

    let doctors = clinic.repos().doctors.list().await.unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].fee, "PKR 1800");
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let clinic = TestClinic::new();
    clinic.add_admin("amina").await;
    let app = auth_routes(clinic.state.clone());

    let response = app
        .oneshot(json_request("POST", "/signup", None, Some(json!({
            "username": "amina",
            "password": "s3cret-pass",
            "phone": "0300",
            "category": "patient",
            "gender": "female",
            "blood_group": "A+"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("amina"));
}

#[tokio::test]
async fn test_signup_with_unknown_category_is_rejected() {
    let clinic = TestClinic::new();
    let app = auth_routes(clinic.state.clone());

    let response = app
        .oneshot(json_request("POST", "/signup", None, Some(json!({
            "username": "nurse.joy",
            "password": "s3cret-pass",
            "phone": "0300",
            "category": "nurse"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(clinic.repos().accounts.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_login_with_missing_fields() {
    let clinic = TestClinic::new();
    let app = auth_routes(clinic.state.clone());

    let response = app
        .oneshot(json_request("POST", "/login", None, Some(json!({ "username": "amina" }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "All fields are required");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let clinic = TestClinic::new();
    let app = auth_routes(clinic.state.clone());

    app.clone()
        .oneshot(json_request("POST", "/signup", None, Some(json!({
            "username": "admin",
            "password": "right-pass",
            "phone": "0300",
            "category": "admin"
        }))))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request("POST", "/login", None, Some(json!({
            "username": "admin",
            "password": "wrong-pass"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_public_admin_signup_only_bootstraps_first_admin() {
    let clinic = TestClinic::new();
    let app = auth_routes(clinic.state.clone());
    let admin = |username: &str| json!({
        "username": username,
        "password": "s3cret-pass",
        "phone": "0300",
        "category": "admin"
    });

    let first = app.clone()
        .oneshot(json_request("POST", "/signup", None, Some(admin("root"))))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(json_request("POST", "/signup", None, Some(admin("intruder"))))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::FORBIDDEN);
    assert!(response_json(second).await["error"].is_string());
    assert!(clinic.repos().accounts.find_by_username("intruder").await.unwrap().is_none());
}
