use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use shared_database::DbClient;
use shared_models::auth::Role;
use shared_models::validation::FieldErrors;

use crate::models::{AppointmentCandidate, AppointmentError};
use crate::services::conflict::ConflictDetectionService;

pub const PAST_DATE_MESSAGE: &str = "Appointment date cannot be in the past.";
pub const SLOT_CONFLICT_MESSAGE: &str =
    "This doctor already has an appointment for that slot.";

/// Account fields the booking paths need about either party.
#[derive(Debug, Clone, Deserialize)]
pub struct Party {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Store-independent inputs to the pure gate: the resolved roles of both
/// referenced accounts, today's date, and whether an active row already
/// occupies the candidate's slot.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub patient_role: Option<Role>,
    pub doctor_role: Option<Role>,
    pub today: NaiveDate,
    pub slot_taken: bool,
}

/// The gate every appointment write goes through. Checks, in order: patient
/// role, doctor role, distinctness, past date (creation only), slot
/// conflict (active candidates only). Returns the whole error map; the
/// caller persists nothing unless this comes back Ok.
pub fn check_candidate(
    candidate: &AppointmentCandidate,
    ctx: &ValidationContext,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    match ctx.patient_role {
        Some(Role::Patient) => {}
        Some(_) => errors.add(
            "patient",
            "Selected patient account does not have the patient role.",
        ),
        None => errors.add("patient", "Patient account does not exist."),
    }

    match ctx.doctor_role {
        Some(Role::Doctor) => {}
        Some(_) => errors.add(
            "doctor",
            "Selected doctor account does not have the doctor role.",
        ),
        None => errors.add("doctor", "Selected doctor does not exist."),
    }

    // Rejected regardless of the shared account's role field.
    if candidate.patient_id == candidate.doctor_id {
        errors.add("doctor", "Patient and doctor must be different accounts.");
    }

    // Date-only comparison, and only on insert: rows that have aged into
    // the past must still accept status-only updates.
    if candidate.is_create() && candidate.date < ctx.today {
        errors.add("date", PAST_DATE_MESSAGE);
    }

    if candidate.status.is_active() && ctx.slot_taken {
        errors.add("time", SLOT_CONFLICT_MESSAGE);
    }

    errors.into_result()
}

/// Resolves the store-dependent half of the context and runs the gate.
pub struct BookingValidationService<'a> {
    db: &'a DbClient,
}

impl<'a> BookingValidationService<'a> {
    pub fn new(db: &'a DbClient) -> Self {
        Self { db }
    }

    pub async fn validate(&self, candidate: &AppointmentCandidate) -> Result<(), AppointmentError> {
        let patient = fetch_party(self.db, candidate.patient_id).await?;
        let doctor = fetch_party(self.db, candidate.doctor_id).await?;

        let slot_taken = if candidate.status.is_active() {
            ConflictDetectionService::new(self.db)
                .slot_taken(candidate.doctor_id, candidate.date, candidate.time, candidate.id)
                .await?
        } else {
            false
        };

        let ctx = ValidationContext {
            patient_role: patient.map(|p| p.role),
            doctor_role: doctor.map(|d| d.role),
            today: Local::now().date_naive(),
            slot_taken,
        };

        debug!("Validating appointment candidate against {:?}", ctx);
        check_candidate(candidate, &ctx).map_err(AppointmentError::Validation)
    }
}

pub(crate) async fn fetch_party(
    db: &DbClient,
    account_id: Uuid,
) -> Result<Option<Party>, AppointmentError> {
    let path = format!(
        "/rest/v1/accounts?id=eq.{}&select=id,username,email,role&limit=1",
        account_id
    );
    let rows: Vec<Party> = db
        .select(&path)
        .await
        .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

    Ok(rows.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::{NaiveDate, NaiveTime};

    fn candidate(status: AppointmentStatus) -> AppointmentCandidate {
        AppointmentCandidate {
            id: None,
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            description: "Routine consultation".to_string(),
            status,
        }
    }

    fn ok_context() -> ValidationContext {
        ValidationContext {
            patient_role: Some(Role::Patient),
            doctor_role: Some(Role::Doctor),
            today: NaiveDate::from_ymd_opt(2026, 2, 24).unwrap(),
            slot_taken: false,
        }
    }

    #[test]
    fn valid_candidate_passes() {
        let result = check_candidate(&candidate(AppointmentStatus::Pending), &ok_context());
        assert!(result.is_ok());
    }

    #[test]
    fn swapped_roles_name_both_fields() {
        let mut ctx = ok_context();
        ctx.patient_role = Some(Role::Doctor);
        ctx.doctor_role = Some(Role::Patient);

        let errors = check_candidate(&candidate(AppointmentStatus::Pending), &ctx).unwrap_err();
        assert!(errors.contains("patient"));
        assert!(errors.contains("doctor"));
    }

    #[test]
    fn missing_doctor_is_a_doctor_field_error() {
        let mut ctx = ok_context();
        ctx.doctor_role = None;

        let errors = check_candidate(&candidate(AppointmentStatus::Pending), &ctx).unwrap_err();
        assert_eq!(errors.messages("doctor"), ["Selected doctor does not exist."]);
    }

    #[test]
    fn self_booking_is_rejected_regardless_of_role() {
        let mut c = candidate(AppointmentStatus::Pending);
        c.doctor_id = c.patient_id;

        // Even with both lookups reporting the "right" role for their slot.
        let errors = check_candidate(&c, &ok_context()).unwrap_err();
        assert!(errors
            .messages("doctor")
            .contains(&"Patient and doctor must be different accounts.".to_string()));
    }

    #[test]
    fn past_date_blocks_creation() {
        let mut c = candidate(AppointmentStatus::Pending);
        c.date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        let errors = check_candidate(&c, &ok_context()).unwrap_err();
        assert_eq!(errors.messages("date"), [PAST_DATE_MESSAGE]);
    }

    #[test]
    fn past_date_is_exempt_on_update() {
        let mut c = candidate(AppointmentStatus::Approved);
        c.id = Some(Uuid::new_v4());
        c.date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        assert!(check_candidate(&c, &ok_context()).is_ok());
    }

    #[test]
    fn booking_today_is_allowed() {
        let mut c = candidate(AppointmentStatus::Pending);
        c.date = ok_context().today;

        assert!(check_candidate(&c, &ok_context()).is_ok());
    }

    #[test]
    fn taken_slot_blocks_active_candidates() {
        let mut ctx = ok_context();
        ctx.slot_taken = true;

        let errors = check_candidate(&candidate(AppointmentStatus::Pending), &ctx).unwrap_err();
        assert_eq!(errors.messages("time"), [SLOT_CONFLICT_MESSAGE]);
    }

    #[test]
    fn taken_slot_ignored_for_rejected_candidate() {
        let mut ctx = ok_context();
        ctx.slot_taken = true;

        // A rejected record frees its slot; writing it back is fine.
        let mut c = candidate(AppointmentStatus::Rejected);
        c.id = Some(Uuid::new_v4());
        assert!(check_candidate(&c, &ctx).is_ok());
    }
}
