use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, MailTransport};
use shared_models::auth::{AuthUser, Role};

use crate::jwt::{build_claims, encode_token, TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH};

pub struct TestConfig {
    pub jwt_secret: String,
    pub database_rest_url: String,
    pub database_service_key: String,
    pub mail_transport: MailTransport,
    pub mail_api_url: String,
    pub mail_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            database_rest_url: "http://localhost:54321".to_string(),
            database_service_key: "test-service-key".to_string(),
            mail_transport: MailTransport::Disabled,
            mail_api_url: String::new(),
            mail_api_key: String::new(),
        }
    }
}

impl TestConfig {
    /// Point the database client at a wiremock server.
    pub fn with_database_url(url: &str) -> Self {
        Self {
            database_rest_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_rest_url: self.database_rest_url.clone(),
            database_service_key: self.database_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            access_token_ttl_minutes: 60,
            refresh_token_ttl_days: 7,
            mail_transport: self.mail_transport.clone(),
            mail_from: "CuraMind AI <no-reply@curamind.local>".to_string(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            mail_api_url: self.mail_api_url.clone(),
            mail_api_key: self.mail_api_key.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_staff: bool,
}

impl TestAccount {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            role,
            is_staff: false,
        }
    }

    pub fn patient(username: &str) -> Self {
        Self::new(username, Role::Patient)
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(username, Role::Doctor)
    }

    pub fn staff(username: &str) -> Self {
        let mut account = Self::new(username, Role::Patient);
        account.is_staff = true;
        account
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            username: self.username.clone(),
            email: Some(self.email.clone()),
            role: self.role,
            is_staff: self.is_staff,
        }
    }

    pub fn access_token(&self, secret: &str) -> String {
        let claims = build_claims(&self.to_auth_user(), TOKEN_TYPE_ACCESS, Duration::hours(1));
        encode_token(&claims, secret).expect("failed to sign test token")
    }

    pub fn refresh_token(&self, secret: &str) -> String {
        let claims = build_claims(&self.to_auth_user(), TOKEN_TYPE_REFRESH, Duration::days(7));
        encode_token(&claims, secret).expect("failed to sign test token")
    }

    pub fn expired_access_token(&self, secret: &str) -> String {
        let claims = build_claims(&self.to_auth_user(), TOKEN_TYPE_ACCESS, Duration::hours(-1));
        encode_token(&claims, secret).expect("failed to sign test token")
    }
}

/// Canned PostgREST rows for mock database responses.
pub struct MockDbRows;

impl MockDbRows {
    pub fn account(account: &TestAccount) -> serde_json::Value {
        json!({
            "id": account.id,
            "username": account.username,
            "email": account.email,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$hashhashhashhash",
            "role": account.role.to_string(),
            "is_staff": account.is_staff,
            "created_at": "2026-01-01T00:00:00+00:00"
        })
    }

    pub fn appointment(
        id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        date: &str,
        time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "date": date,
            "time": time,
            "description": "Routine consultation",
            "status": status,
            "created_at": "2026-01-01T00:00:00+00:00"
        })
    }
}
