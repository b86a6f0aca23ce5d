use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use account_cell::router::account_routes;
use admin_cell::router::admin_routes;
use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "CuraMind Clinic API is running!" }))
        .nest("/auth", account_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()))
}
