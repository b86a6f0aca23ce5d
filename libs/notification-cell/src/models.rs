use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

/// Everything the dispatcher needs to compose a status-change email. Kept
/// free of appointment-cell types so the dependency points one way.
#[derive(Debug, Clone)]
pub struct StatusNotification {
    pub appointment_id: Uuid,
    pub patient_username: String,
    pub patient_email: String,
    pub doctor_username: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Resolved status, lowercase ("approved" or "rejected").
    pub status: String,
}
