use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use notification_cell::{EmailNotifier, StatusNotification};
use shared_config::AppConfig;
use shared_database::{DbClient, DbError};
use shared_models::auth::{AuthUser, Role};
use shared_models::validation::FieldErrors;

use crate::models::{
    Appointment, AppointmentCandidate, AppointmentError, AppointmentFilter, AppointmentStatus,
    BookAppointmentRequest, ResolutionOutcome,
};
use crate::services::validation::{fetch_party, BookingValidationService, SLOT_CONFLICT_MESSAGE};

const APPOINTMENTS_PATH: &str = "/rest/v1/appointments";
const DEFAULT_PAGE_SIZE: i32 = 50;
const MAX_PAGE_SIZE: i32 = 200;

pub struct AppointmentBookingService {
    db: DbClient,
    notifier: EmailNotifier,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DbClient::new(config),
            notifier: EmailNotifier::new(config),
        }
    }

    /// Create a pending appointment for the calling patient. Runs the full
    /// validation gate first; the store's conditional uniqueness constraint
    /// backstops the slot pre-check, and a constraint hit is reported with
    /// the same field error the pre-check would have produced.
    pub async fn book(
        &self,
        patient: &AuthUser,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let candidate = AppointmentCandidate {
            id: None,
            patient_id: patient.id,
            doctor_id: request.doctor,
            date: request.date,
            time: request.time,
            description: request.description,
            status: AppointmentStatus::Pending,
        };

        BookingValidationService::new(&self.db)
            .validate(&candidate)
            .await?;

        let body = json!({
            "patient_id": candidate.patient_id,
            "doctor_id": candidate.doctor_id,
            "date": candidate.date,
            "time": candidate.time,
            "description": candidate.description,
            "status": candidate.status,
        });

        let rows: Vec<Appointment> = self
            .db
            .insert(APPOINTMENTS_PATH, body)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation => AppointmentError::Validation(FieldErrors::single(
                    "time",
                    SLOT_CONFLICT_MESSAGE,
                )),
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        let appointment = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("insert returned no rows".to_string()))?;

        info!(
            "Booked appointment {} for patient {} with doctor {}",
            appointment.id, appointment.patient_id, appointment.doctor_id
        );
        Ok(appointment)
    }

    /// List the caller's appointments, newest slot first. Patients see rows
    /// where they are the patient, doctors where they are the doctor. Staff
    /// get nothing here; their cross-account view lives under the
    /// administrative routes.
    pub async fn list_for(
        &self,
        user: &AuthUser,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let scope = if user.is_admin() {
            return Ok(Vec::new());
        } else if user.role == Role::Doctor {
            format!("doctor_id=eq.{}", user.id)
        } else {
            format!("patient_id=eq.{}", user.id)
        };

        let mut query_parts = vec![scope];

        if let Some(status) = filter.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(from) = filter.date_from {
            query_parts.push(format!("date=gte.{}", from));
        }
        if let Some(to) = filter.date_to {
            query_parts.push(format!("date=lte.{}", to));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("*{}*", search);
            query_parts.push(format!("description=ilike.{}", urlencoding::encode(&pattern)));
        }

        query_parts.push("order=date.desc,time.desc".to_string());

        let limit = filter
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        query_parts.push(format!("limit={}", limit));

        if let Some(offset) = filter.offset {
            query_parts.push(format!("offset={}", offset.max(0)));
        }

        let path = format!("{}?{}", APPOINTMENTS_PATH, query_parts.join("&"));

        self.db
            .select(&path)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    /// Fetch one appointment for the caller. Participants and staff may see
    /// it; everyone else gets the same not-found as a nonexistent id.
    pub async fn get_for(&self, user: &AuthUser, id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .find_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let is_party = appointment.patient_id == user.id || appointment.doctor_id == user.id;
        if !is_party && !user.is_admin() {
            return Err(AppointmentError::NotFound);
        }

        Ok(appointment)
    }

    /// Resolve a pending appointment to approved or rejected. Only the
    /// doctor named on the record may resolve it; for anyone else the id
    /// does not exist. Resolving an already-resolved record changes nothing.
    pub async fn resolve(
        &self,
        doctor: &AuthUser,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<ResolutionOutcome, AppointmentError> {
        let path = format!(
            "{}?id=eq.{}&doctor_id=eq.{}&limit=1",
            APPOINTMENTS_PATH, id, doctor.id
        );
        let rows: Vec<Appointment> = self
            .db
            .select(&path)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let current = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;

        if current.status.is_resolved() {
            info!(
                "Appointment {} already {}, leaving it unchanged",
                current.id, current.status
            );
            return Ok(ResolutionOutcome {
                appointment: current,
                changed: false,
                notified: false,
            });
        }

        // The pending guard makes the transition atomic: a concurrent
        // resolution leaves zero rows to update here.
        let update_path = format!(
            "{}?id=eq.{}&doctor_id=eq.{}&status=eq.pending",
            APPOINTMENTS_PATH, id, doctor.id
        );
        let updated: Vec<Appointment> = self
            .db
            .update(&update_path, json!({ "status": status }))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = match updated.into_iter().next() {
            Some(a) => a,
            None => {
                warn!("Appointment {} was resolved concurrently", id);
                let refreshed = self
                    .find_by_id(id)
                    .await?
                    .ok_or(AppointmentError::NotFound)?;
                return Ok(ResolutionOutcome {
                    appointment: refreshed,
                    changed: false,
                    notified: false,
                });
            }
        };

        info!("Appointment {} {} by doctor {}", appointment.id, status, doctor.id);

        let notified = self.notify_patient(&appointment).await;

        Ok(ResolutionOutcome {
            appointment,
            changed: true,
            notified,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("{}?id=eq.{}&limit=1", APPOINTMENTS_PATH, id);
        let rows: Vec<Appointment> = self
            .db
            .select(&path)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    /// Best effort only. A lookup or transport failure is logged and
    /// reported as not-notified; it never rolls back or fails the
    /// resolution itself.
    async fn notify_patient(&self, appointment: &Appointment) -> bool {
        let patient = match fetch_party(&self.db, appointment.patient_id).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                warn!(
                    "Patient {} missing for appointment {}, skipping notification",
                    appointment.patient_id, appointment.id
                );
                return false;
            }
            Err(e) => {
                warn!(
                    "Could not load patient for appointment {}: {}",
                    appointment.id, e
                );
                return false;
            }
        };

        let doctor = match fetch_party(&self.db, appointment.doctor_id).await {
            Ok(Some(d)) => d,
            Ok(None) => {
                warn!(
                    "Doctor {} missing for appointment {}, skipping notification",
                    appointment.doctor_id, appointment.id
                );
                return false;
            }
            Err(e) => {
                warn!(
                    "Could not load doctor for appointment {}: {}",
                    appointment.id, e
                );
                return false;
            }
        };

        let notification = StatusNotification {
            appointment_id: appointment.id,
            patient_username: patient.username,
            patient_email: patient.email,
            doctor_username: doctor.username,
            date: appointment.date,
            time: appointment.time,
            status: appointment.status.to_string(),
        };

        self.notifier.send_status_email(&notification).await
    }
}
