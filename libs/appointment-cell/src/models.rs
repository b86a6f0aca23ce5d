use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_models::validation::FieldErrors;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A scheduled meeting between exactly one patient-role account and one
/// doctor-role account. Rows only leave the store through account-deletion
/// cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub description: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppointmentStatus {
    /// Active statuses are the set the slot-conflict rule is checked
    /// against.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Approved)
    }

    /// A resolved appointment never transitions again.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, AppointmentStatus::Pending)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Approved => write!(f, "approved"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentListParams {
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Free-text search over the description.
    pub q: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// Parsed, validated form of the listing filters.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// A not-yet-persisted appointment handed to the validation gate. `id` is
/// set only in the update-in-place case so the conflict check can exclude
/// the candidate's own row.
#[derive(Debug, Clone)]
pub struct AppointmentCandidate {
    pub id: Option<Uuid>,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub description: String,
    pub status: AppointmentStatus,
}

impl AppointmentCandidate {
    pub fn is_create(&self) -> bool {
        self.id.is_none()
    }
}

/// Result of an approve/reject request. `changed` is false when the record
/// was already resolved (the transition is an idempotent no-op); `notified`
/// reports whether the status email went out.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub appointment: Appointment,
    pub changed: bool,
    pub notified: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("{0}")]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
