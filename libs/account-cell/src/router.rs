use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn account_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/register/patient", post(handlers::register_patient))
        .route("/register/doctor", post(handlers::register_doctor))
        .route("/token", post(handlers::obtain_token_pair))
        .route("/token/refresh", post(handlers::refresh_token));

    let protected_routes = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/redirect", get(handlers::role_redirect))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
