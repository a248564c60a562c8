// libs/billing-cell/tests/ledger_test.rs
use assert_matches::assert_matches;
use axum::http::StatusCode;
use tower::ServiceExt;
use uuid::Uuid;

use billing_cell::models::BillingError;
use billing_cell::router::billing_routes;
use billing_cell::services::BillingService;
use shared_models::clinic::{AppointmentStatus, Bill, BillStatus, NewAppointment, NewBill};
use shared_utils::test_utils::{date, json_request, response_json, time, TestClinic};

async fn seed_bill(clinic: &TestClinic, patient_id: Uuid, doctor_id: Uuid, day: &str, amount: i64) -> Bill {
    let appointment = clinic.repos().appointments.create(NewAppointment {
        patient_id,
        doctor_id,
        date: date(day),
        time: time("09:00:00"),
        reason: "checkup".to_string(),
        status: AppointmentStatus::Confirmed,
    }).await.unwrap();

    clinic.repos().bills
        .create(NewBill { appointment_id: appointment.id, amount })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_paying_twice_does_not_double_revenue() {
    let clinic = TestClinic::new();
    let (_, doctor) = clinic.add_doctor("dr.khan", "PKR 1500").await;
    let (patient, _) = clinic.add_patient("amina").await;
    let bill = seed_bill(&clinic, patient.id, doctor.id, "2025-05-10", 1500).await;
    seed_bill(&clinic, patient.id, doctor.id, "2025-05-11", 700).await;
    let service = BillingService::new(clinic.repos());

    assert_eq!(service.total_revenue().await.unwrap(), 0);

    let paid = service.pay_bill(bill.id).await.unwrap();
    assert_eq!(paid.status, BillStatus::Paid);
    assert_eq!(service.total_revenue().await.unwrap(), 1500);

    service.pay_bill(bill.id).await.unwrap();
    assert_eq!(service.total_revenue().await.unwrap(), 1500);
}

#[tokio::test]
async fn test_paying_unknown_bill_is_not_found() {
    let clinic = TestClinic::new();
    let result = BillingService::new(clinic.repos()).pay_bill(Uuid::new_v4()).await;
    assert_matches!(result, Err(BillingError::NotFound));
}

#[tokio::test]
async fn test_bills_filtered_by_patient() {
    let clinic = TestClinic::new();
    let (_, doctor) = clinic.add_doctor("dr.khan", "PKR 1500").await;
    let (amina, _) = clinic.add_patient("amina").await;
    let (bilal, _) = clinic.add_patient("bilal").await;
    let own = seed_bill(&clinic, amina.id, doctor.id, "2025-05-10", 1500).await;
    seed_bill(&clinic, bilal.id, doctor.id, "2025-05-11", 1500).await;
    let service = BillingService::new(clinic.repos());

    assert_eq!(service.list_bills(None).await.unwrap().len(), 2);
    let bills = service.list_bills(Some(amina.id)).await.unwrap();
    assert_eq!(bills, vec![own]);
}

#[tokio::test]
async fn test_pay_route_returns_paid_bill() {
    let clinic = TestClinic::new();
    let (_, doctor) = clinic.add_doctor("dr.khan", "PKR 1500").await;
    let (patient, _) = clinic.add_patient("amina").await;
    let bill = seed_bill(&clinic, patient.id, doctor.id, "2025-05-10", 1500).await;
    let app = billing_routes(clinic.state.clone());

    let response = app.clone()
        .oneshot(json_request("PUT", &format!("/bills/{}/pay", bill.id), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Paid successfully");
    assert_eq!(body["bill"]["status"], "paid");

    let response = app
        .oneshot(json_request("GET", &format!("/bills?patient_id={}", patient.id), None, None))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body[0]["id"], bill.id.to_string());
    assert_eq!(body[0]["amount"], 1500);
}

#[tokio::test]
async fn test_pay_route_for_missing_bill() {
    let clinic = TestClinic::new();
    let response = billing_routes(clinic.state.clone())
        .oneshot(json_request("PUT", &format!("/bills/{}/pay", Uuid::new_v4()), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Bill not found");
}
