// libs/billing-cell/src/handlers.rs
use axum::{
    extract::State,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::clinic::Bill;
use shared_models::error::AppError;
use shared_utils::extractor::{ValidPath, ValidQuery};

use crate::models::BillQuery;
use crate::services::BillingService;

pub async fn list_bills(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<BillQuery>,
) -> Result<Json<Vec<Bill>>, AppError> {
    let bills = BillingService::new(&state.repos).list_bills(query.patient_id).await?;
    Ok(Json(bills))
}

pub async fn pay_bill(
    State(state): State<AppState>,
    ValidPath(bill_id): ValidPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    let bill = BillingService::new(&state.repos).pay_bill(bill_id).await?;

    Ok(Json(json!({
        "message": "Paid successfully",
        "bill": bill
    })))
}
