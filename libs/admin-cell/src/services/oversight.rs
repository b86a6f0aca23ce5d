use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus};
use shared_config::AppConfig;
use shared_database::DbClient;
use shared_models::auth::Role;

use crate::models::{AccountSummary, AdminError};

const ACCOUNT_COLUMNS: &str = "id,username,email,role,is_staff,created_at";
const DEFAULT_PAGE_SIZE: i32 = 50;
const MAX_PAGE_SIZE: i32 = 200;

#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub role: Option<Role>,
    pub username_search: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct OversightAppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// Cross-account views for staff. Authorization happens in the handlers;
/// everything here runs with full visibility.
pub struct OversightService {
    db: DbClient,
}

impl OversightService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DbClient::new(config),
        }
    }

    pub async fn list_accounts(
        &self,
        filter: &AccountFilter,
    ) -> Result<Vec<AccountSummary>, AdminError> {
        let mut query_parts = vec![format!("select={}", ACCOUNT_COLUMNS)];

        if let Some(role) = filter.role {
            query_parts.push(format!("role=eq.{}", role));
        }
        if let Some(search) = &filter.username_search {
            let pattern = format!("*{}*", search);
            query_parts.push(format!("username=ilike.{}", urlencoding::encode(&pattern)));
        }

        query_parts.push("order=username.asc".to_string());
        query_parts.push(format!("limit={}", page_size(filter.limit)));
        if let Some(offset) = filter.offset {
            query_parts.push(format!("offset={}", offset.max(0)));
        }

        let path = format!("/rest/v1/accounts?{}", query_parts.join("&"));

        self.db
            .select(&path)
            .await
            .map_err(|e| AdminError::DatabaseError(e.to_string()))
    }

    /// Remove an account. The store cascades the delete to every
    /// appointment the account appears on, as patient or as doctor.
    pub async fn delete_account(&self, account_id: Uuid) -> Result<AccountSummary, AdminError> {
        let path = format!(
            "/rest/v1/accounts?id=eq.{}&select={}",
            account_id, ACCOUNT_COLUMNS
        );
        let removed: Vec<AccountSummary> = self
            .db
            .delete(&path)
            .await
            .map_err(|e| AdminError::DatabaseError(e.to_string()))?;

        let account = removed
            .into_iter()
            .next()
            .ok_or(AdminError::AccountNotFound)?;

        info!(
            "Deleted account {} ({}) and its appointments",
            account.id, account.username
        );
        Ok(account)
    }

    pub async fn list_appointments(
        &self,
        filter: &OversightAppointmentFilter,
    ) -> Result<Vec<Appointment>, AdminError> {
        let mut query_parts = Vec::new();

        if let Some(status) = filter.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(doctor_id) = filter.doctor_id {
            query_parts.push(format!("doctor_id=eq.{}", doctor_id));
        }
        if let Some(patient_id) = filter.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(from) = filter.date_from {
            query_parts.push(format!("date=gte.{}", from));
        }
        if let Some(to) = filter.date_to {
            query_parts.push(format!("date=lte.{}", to));
        }

        query_parts.push("order=date.desc,time.desc".to_string());
        query_parts.push(format!("limit={}", page_size(filter.limit)));
        if let Some(offset) = filter.offset {
            query_parts.push(format!("offset={}", offset.max(0)));
        }

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));

        self.db
            .select(&path)
            .await
            .map_err(|e| AdminError::DatabaseError(e.to_string()))
    }
}

fn page_size(requested: Option<i32>) -> i32 {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}
