use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::DbClient;

use crate::models::{Appointment, AppointmentError};

/// Slot-conflict detection: a slot is the (doctor, date, time) triple, and
/// it is taken while any appointment in an active status occupies it.
pub struct ConflictDetectionService<'a> {
    db: &'a DbClient,
}

impl<'a> ConflictDetectionService<'a> {
    pub fn new(db: &'a DbClient) -> Self {
        Self { db }
    }

    /// Application-level pre-check. The database's conditional uniqueness
    /// constraint closes the race window this check cannot.
    pub async fn slot_taken(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking slot availability for doctor {} on {} at {}",
            doctor_id, date, time
        );

        let mut query_parts = vec![
            format!("doctor_id=eq.{}", doctor_id),
            format!("date=eq.{}", date),
            format!("time=eq.{}", time),
            "status=in.(pending,approved)".to_string(),
        ];

        if let Some(exclude_id) = exclude_appointment_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        let path = format!("/rest/v1/appointments?{}&limit=1", query_parts.join("&"));

        let rows: Vec<Appointment> = self
            .db
            .select(&path)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let taken = !rows.is_empty();
        if taken {
            warn!(
                "Slot conflict for doctor {} on {} at {}",
                doctor_id, date, time
            );
        }

        Ok(taken)
    }
}
