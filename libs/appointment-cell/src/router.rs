// libs/appointment-cell/src/router.rs
use axum::{
    routing::{get, put},
    Router,
};

use shared_database::AppState;

use crate::handlers;

pub fn appointment_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/appointments",
            get(handlers::list_appointments).post(handlers::create_appointment),
        )
        .route(
            "/appointments/{appointment_id}",
            put(handlers::update_appointment_status).delete(handlers::delete_appointment),
        )
        .route("/patient/{patient_id}/appointments", get(handlers::get_patient_appointments))
        .route("/doctor/{doctor_id}/appointments", get(handlers::get_doctor_appointments))
        .with_state(state)
}
