use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::auth::{AccessTokenResponse, AuthUser, Role, TokenPairResponse};
use shared_models::error::AppError;

use crate::models::{AccountError, LoginRequest, RefreshRequest, RegisterRequest};
use crate::services::account::AccountService;

fn map_account_error(e: AccountError) -> AppError {
    match e {
        AccountError::Validation(errors) => AppError::Validation(errors),
        AccountError::InvalidCredentials => {
            AppError::Auth("Invalid username or password".to_string())
        }
        AccountError::NotFound => AppError::NotFound("Account not found".to_string()),
        AccountError::DatabaseError(msg) => AppError::Database(msg),
        AccountError::Internal(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    register(state, request, Role::Patient).await
}

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    register(state, request, Role::Doctor).await
}

async fn register(
    state: Arc<AppConfig>,
    request: RegisterRequest,
    role: Role,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AccountService::new(&state);

    let account = service
        .register(request, role)
        .await
        .map_err(map_account_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "account": account,
            "message": "Registration successful"
        })),
    ))
}

#[axum::debug_handler]
pub async fn obtain_token_pair(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let service = AccountService::new(&state);

    let account = service
        .authenticate(&request)
        .await
        .map_err(map_account_error)?;

    let pair = service.issue_token_pair(&account).map_err(map_account_error)?;

    info!("Issued token pair for account {}", account.id);
    Ok(Json(pair))
}

#[axum::debug_handler]
pub async fn refresh_token(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let service = AccountService::new(&state);

    let access = service
        .refresh_access_token(&request.refresh)
        .map_err(|_| AppError::Auth("Invalid or expired refresh token".to_string()))?;

    Ok(Json(AccessTokenResponse { access }))
}

/// Stateless acknowledgment; tokens expire on their own. Routed POST-only so
/// a GET comes back 405.
#[axum::debug_handler]
pub async fn logout(Extension(user): Extension<AuthUser>) -> StatusCode {
    debug!("Logout acknowledged for account {}", user.id);
    StatusCode::NO_CONTENT
}

/// Role-based landing redirect: staff and admins land on the administrative
/// view, doctors and patients on their (role-scoped) appointment list.
#[axum::debug_handler]
pub async fn role_redirect(Extension(user): Extension<AuthUser>) -> Redirect {
    if user.is_admin() {
        Redirect::to("/admin/appointments")
    } else {
        Redirect::to("/appointments")
    }
}
