use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::list_appointments).post(handlers::book_appointment),
        )
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/{appointment_id}/approve",
            post(handlers::approve_appointment),
        )
        .route(
            "/{appointment_id}/reject",
            post(handlers::reject_appointment),
        )
        .route("/{appointment_id}/status", post(handlers::update_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
