// libs/doctor-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctor/slots", get(handlers::list_slots))
        .route("/doctor/{doctor_id}", get(handlers::get_doctor))
        .route("/doctor/{doctor_id}/stats", get(handlers::get_doctor_stats))
        .route("/doctor/{doctor_id}/served-patients", get(handlers::get_served_patients))
        .route("/doctor/{doctor_id}/slots", get(handlers::get_available_slots));

    let protected_routes = Router::new()
        .route("/doctor/slots", post(handlers::create_slot))
        .route("/doctor/{doctor_id}", put(handlers::update_doctor))
        .route_layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
