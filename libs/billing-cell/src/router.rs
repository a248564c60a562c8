// libs/billing-cell/src/router.rs
use axum::{
    routing::{get, put},
    Router,
};

use shared_database::AppState;

use crate::handlers;

pub fn billing_routes(state: AppState) -> Router {
    Router::new()
        .route("/bills", get(handlers::list_bills))
        .route("/bills/{bill_id}/pay", put(handlers::pay_bill))
        .with_state(state)
}
