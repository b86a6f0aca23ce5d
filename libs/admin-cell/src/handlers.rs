use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{AccountListParams, AdminAppointmentParams, AdminError};
use crate::services::oversight::{AccountFilter, OversightAppointmentFilter, OversightService};

const INVALID_DATE_MESSAGE: &str = "Invalid date format. Use YYYY-MM-DD for date_from/date_to.";

fn require_staff(user: &AuthUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Staff access required.".to_string()))
    }
}

fn map_admin_error(e: AdminError) -> AppError {
    match e {
        AdminError::AccountNotFound => AppError::NotFound("Account not found".to_string()),
        AdminError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(INVALID_DATE_MESSAGE.to_string()))
}

#[axum::debug_handler]
pub async fn list_accounts(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AccountListParams>,
) -> Result<Json<Value>, AppError> {
    require_staff(&user)?;

    let filter = AccountFilter {
        role: params.role,
        username_search: params.q.filter(|q| !q.trim().is_empty()),
        limit: params.limit,
        offset: params.offset,
    };

    let service = OversightService::new(&state);
    let accounts = service
        .list_accounts(&filter)
        .await
        .map_err(map_admin_error)?;

    debug!("Staff {} listed {} accounts", user.id, accounts.len());
    Ok(Json(json!({
        "count": accounts.len(),
        "accounts": accounts,
    })))
}

#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_staff(&user)?;

    let service = OversightService::new(&state);
    service
        .delete_account(account_id)
        .await
        .map_err(map_admin_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AdminAppointmentParams>,
) -> Result<Json<Value>, AppError> {
    require_staff(&user)?;

    let date_from = params.date_from.as_deref().map(parse_date).transpose()?;
    let date_to = params.date_to.as_deref().map(parse_date).transpose()?;

    let filter = OversightAppointmentFilter {
        status: params.status,
        doctor_id: params.doctor,
        patient_id: params.patient,
        date_from,
        date_to,
        limit: params.limit,
        offset: params.offset,
    };

    let service = OversightService::new(&state);
    let appointments = service
        .list_appointments(&filter)
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "count": appointments.len(),
        "appointments": appointments,
    })))
}
