// libs/admin-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/admin/stats", get(handlers::get_stats))
        .route("/admin/users", get(handlers::list_users).post(handlers::create_user))
        .route("/admin/users/{user_id}", put(handlers::update_user).delete(handlers::delete_user))
        .route("/admin/feedback", get(handlers::list_feedback))
        .route_layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
