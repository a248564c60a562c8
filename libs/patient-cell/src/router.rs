// libs/patient-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/patients", get(handlers::list_patients))
        .route("/medical-records", get(handlers::list_medical_records))
        .route("/feedback", post(handlers::submit_feedback));

    let protected_routes = Router::new()
        .route("/medical-records", post(handlers::create_medical_record))
        .route_layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
