// libs/doctor-cell/tests/slots_test.rs
use assert_matches::assert_matches;
use uuid::Uuid;

use doctor_cell::models::{CreateSlotRequest, SlotError, SlotInput};
use doctor_cell::services::SlotService;
use shared_models::clinic::SlotClaim;
use shared_utils::test_utils::{date, time, TestClinic, TestUser};

#[tokio::test]
async fn test_list_slots_for_doctor_without_slots_is_empty() {
    let clinic = TestClinic::new();
    let (_, doctor) = clinic.add_doctor("dr.khan", "PKR 1500").await;

    let slots = SlotService::new(clinic.repos()).list_slots(Some(doctor.id)).await.unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_list_slots_accepts_account_id_and_orders_newest_first() {
    let clinic = TestClinic::new();
    let (account, doctor) = clinic.add_doctor("dr.khan", "PKR 1500").await;
    let service = SlotService::new(clinic.repos());

    service.create_slot(doctor.id, date("2025-05-10"), time("09:00:00")).await.unwrap();
    service.create_slot(doctor.id, date("2025-05-11"), time("09:00:00")).await.unwrap();
    service.create_slot(doctor.id, date("2025-05-10"), time("14:00:00")).await.unwrap();

    let slots = service.list_slots(Some(account.id)).await.unwrap();
    let order: Vec<_> = slots.iter().map(|s| (s.date, s.time)).collect();
    assert_eq!(order, vec![
        (date("2025-05-11"), time("09:00:00")),
        (date("2025-05-10"), time("14:00:00")),
        (date("2025-05-10"), time("09:00:00")),
    ]);
}

#[tokio::test]
async fn test_list_slots_for_unknown_doctor_is_not_found() {
    let clinic = TestClinic::new();
    let result = SlotService::new(clinic.repos()).list_slots(Some(Uuid::new_v4())).await;
    assert_matches!(result, Err(SlotError::DoctorNotFound));
}

#[tokio::test]
async fn test_duplicate_slot_is_a_conflict() {
    let clinic = TestClinic::new();
    let (_, doctor) = clinic.add_doctor("dr.khan", "PKR 1500").await;
    let service = SlotService::new(clinic.repos());

    service.create_slot(doctor.id, date("2025-05-10"), time("09:00:00")).await.unwrap();
    let result = service.create_slot(doctor.id, date("2025-05-10"), time("09:00:00")).await;

    assert_matches!(result, Err(SlotError::Duplicate { .. }));
    assert_eq!(service.list_slots(Some(doctor.id)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_available_slots_hide_booked_ones() {
    let clinic = TestClinic::new();
    let (_, doctor) = clinic.add_doctor("dr.khan", "PKR 1500").await;
    clinic.add_slot(doctor.id, date("2025-05-10"), time("09:00:00")).await;
    clinic.add_slot(doctor.id, date("2025-05-10"), time("10:00:00")).await;

    let claim = clinic.repos().slots
        .claim(doctor.id, date("2025-05-10"), time("09:00:00"))
        .await
        .unwrap();
    assert_matches!(claim, SlotClaim::Claimed(_));

    let available = SlotService::new(clinic.repos()).list_available(doctor.id).await.unwrap();
    assert_eq!(available.fee, "PKR 1500");
    assert_eq!(available.specialty, "Cardiology");
    assert_eq!(available.slots.len(), 1);
    assert_eq!(available.slots[0].time, time("10:00:00"));
}

#[tokio::test]
async fn test_doctor_creates_slot_for_own_profile_only() {
    let clinic = TestClinic::new();
    let (account, doctor) = clinic.add_doctor("dr.khan", "PKR 1500").await;
    let (_, other) = clinic.add_doctor("dr.ali", "PKR 1000").await;
    let service = SlotService::new(clinic.repos());
    let caller = TestUser::from_account(&account).to_user();

    let slot = service.create_slot_for(&caller, CreateSlotRequest {
        doctor_id: None,
        slot: SlotInput { date: date("2025-05-10"), time: time("09:00:00") },
    }).await.unwrap();
    assert_eq!(slot.doctor_id, doctor.id);
    assert!(!slot.is_booked);

    let result = service.create_slot_for(&caller, CreateSlotRequest {
        doctor_id: Some(other.id),
        slot: SlotInput { date: date("2025-05-10"), time: time("09:00:00") },
    }).await;
    assert_matches!(result, Err(SlotError::Forbidden(_)));
}

#[tokio::test]
async fn test_admin_must_name_the_doctor() {
    let clinic = TestClinic::new();
    let admin = clinic.add_admin("root").await;
    let caller = TestUser::from_account(&admin).to_user();

    let result = SlotService::new(clinic.repos()).create_slot_for(&caller, CreateSlotRequest {
        doctor_id: None,
        slot: SlotInput { date: date("2025-05-10"), time: time("09:00:00") },
    }).await;
    assert_matches!(result, Err(SlotError::Validation(_)));
}
