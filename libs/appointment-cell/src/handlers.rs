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
use shared_models::auth::{AuthUser, Role};
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentFilter, AppointmentListParams, AppointmentStatus,
    BookAppointmentRequest, ResolutionOutcome, StatusUpdateRequest,
};
use crate::services::booking::AppointmentBookingService;

const INVALID_DATE_MESSAGE: &str = "Invalid date format. Use YYYY-MM-DD for date_from/date_to.";

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::Validation(errors) => AppError::Validation(errors),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn parse_filter(params: AppointmentListParams) -> Result<AppointmentFilter, AppError> {
    let parse_date = |raw: &str| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(INVALID_DATE_MESSAGE.to_string()))
    };

    let date_from = params.date_from.as_deref().map(parse_date).transpose()?;
    let date_to = params.date_to.as_deref().map(parse_date).transpose()?;

    Ok(AppointmentFilter {
        status: params.status,
        date_from,
        date_to,
        search: params.q.filter(|q| !q.trim().is_empty()),
        limit: params.limit,
        offset: params.offset,
    })
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AppointmentListParams>,
) -> Result<Json<Value>, AppError> {
    let filter = parse_filter(params)?;

    let service = AppointmentBookingService::new(&state);
    let appointments = service
        .list_for(&user, &filter)
        .await
        .map_err(map_appointment_error)?;

    debug!(
        "Listed {} appointments for account {}",
        appointments.len(),
        user.id
    );
    Ok(Json(json!({
        "count": appointments.len(),
        "appointments": appointments,
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if user.role != Role::Patient {
        return Err(AppError::Forbidden(
            "Only patients can create appointments.".to_string(),
        ));
    }

    let service = AppointmentBookingService::new(&state);
    let appointment = service
        .book(&user, request)
        .await
        .map_err(map_appointment_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "appointment": appointment,
            "message": "Appointment requested"
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service
        .get_for(&user, appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn approve_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    resolve(state, user, appointment_id, AppointmentStatus::Approved).await
}

#[axum::debug_handler]
pub async fn reject_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    resolve(state, user, appointment_id, AppointmentStatus::Rejected).await
}

/// Generic status endpoint; accepts the two resolved statuses only.
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    if request.status == AppointmentStatus::Pending {
        return Err(AppError::BadRequest(
            "Status must be approved or rejected.".to_string(),
        ));
    }

    resolve(state, user, appointment_id, request.status).await
}

async fn resolve(
    state: Arc<AppConfig>,
    user: AuthUser,
    appointment_id: Uuid,
    status: AppointmentStatus,
) -> Result<Json<Value>, AppError> {
    if user.role != Role::Doctor {
        return Err(AppError::Forbidden(
            "Only doctors can update appointment status.".to_string(),
        ));
    }

    let service = AppointmentBookingService::new(&state);
    let outcome = service
        .resolve(&user, appointment_id, status)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(resolution_body(outcome)))
}

fn resolution_body(outcome: ResolutionOutcome) -> Value {
    let mut body = json!({
        "success": true,
        "changed": outcome.changed,
        "appointment": outcome.appointment,
    });

    if outcome.changed && !outcome.notified {
        body["warning"] = json!("Status updated but the notification email could not be sent");
    }

    body
}
