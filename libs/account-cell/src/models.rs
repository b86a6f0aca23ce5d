use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::auth::{AuthUser, Role};
use shared_models::validation::FieldErrors;

/// A person using the system. The role tag is fixed at creation; the only
/// way an account disappears is administrative deletion, which cascades to
/// its appointments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            username: self.username.clone(),
            email: if self.email.is_empty() {
                None
            } else {
                Some(self.email.clone())
            },
            role: self.role,
            is_staff: self.is_staff,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
