use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{DbClient, DbError};
use shared_models::auth::{Role, TokenPairResponse};
use shared_models::validation::FieldErrors;
use shared_utils::jwt::{
    build_claims, encode_token, validate_refresh_token, TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH,
};

use crate::models::{Account, AccountError, LoginRequest, RegisterRequest};
use crate::services::password::{hash_password, verify_password};

pub struct AccountService {
    db: DbClient,
    jwt_secret: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: DbClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
            access_token_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_token_ttl: Duration::days(config.refresh_token_ttl_days),
        }
    }

    /// Create an account with the role fixed by the registration path.
    /// Username uniqueness is pre-checked and also guarded by the database
    /// constraint; the constraint violation maps to the same field error.
    pub async fn register(
        &self,
        request: RegisterRequest,
        role: Role,
    ) -> Result<Account, AccountError> {
        let mut errors = FieldErrors::new();

        if request.username.trim().is_empty() {
            errors.add("username", "This field is required.");
        }
        if request.email.trim().is_empty() || !request.email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }
        if request.password.len() < 8 {
            errors.add("password", "Password must be at least 8 characters long.");
        }

        if errors.is_empty() && self.find_by_username(&request.username).await?.is_some() {
            errors.add("username", "A user with that username already exists.");
        }

        errors.into_result().map_err(AccountError::Validation)?;

        let password_hash = hash_password(&request.password)
            .map_err(|e| AccountError::Internal(format!("Failed to hash password: {}", e)))?;

        let account_data = json!({
            "username": request.username.trim(),
            "email": request.email.trim(),
            "password_hash": password_hash,
            "role": role.to_string(),
            "is_staff": false,
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Account> = self
            .db
            .insert("/rest/v1/accounts", account_data)
            .await
            .map_err(|e| match e {
                // Concurrent registration of the same username: the second
                // insert fails on the unique index, not at the pre-check.
                DbError::UniqueViolation => AccountError::Validation(FieldErrors::single(
                    "username",
                    "A user with that username already exists.",
                )),
                other => AccountError::DatabaseError(other.to_string()),
            })?;

        let account = result
            .into_iter()
            .next()
            .ok_or_else(|| AccountError::DatabaseError("Failed to create account".to_string()))?;

        info!("Registered {} account {}", role, account.id);
        Ok(account)
    }

    /// Verify credentials against the stored argon2 hash.
    pub async fn authenticate(&self, request: &LoginRequest) -> Result<Account, AccountError> {
        let account = self
            .find_by_username(&request.username)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let valid = verify_password(&request.password, &account.password_hash)
            .map_err(|e| AccountError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            debug!("Password mismatch for account {}", account.id);
            return Err(AccountError::InvalidCredentials);
        }

        Ok(account)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError> {
        let path = format!(
            "/rest/v1/accounts?username=eq.{}&limit=1",
            urlencoding::encode(username)
        );
        let rows: Vec<Account> = self
            .db
            .select(&path)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    /// Mint an access/refresh pair for a verified account.
    pub fn issue_token_pair(&self, account: &Account) -> Result<TokenPairResponse, AccountError> {
        let user = account.to_auth_user();

        let access_claims = build_claims(&user, TOKEN_TYPE_ACCESS, self.access_token_ttl);
        let refresh_claims = build_claims(&user, TOKEN_TYPE_REFRESH, self.refresh_token_ttl);

        let access = encode_token(&access_claims, &self.jwt_secret)
            .map_err(AccountError::Internal)?;
        let refresh = encode_token(&refresh_claims, &self.jwt_secret)
            .map_err(AccountError::Internal)?;

        Ok(TokenPairResponse { access, refresh })
    }

    /// Exchange a valid refresh token for a new access token.
    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AccountError> {
        let user = validate_refresh_token(refresh_token, &self.jwt_secret)
            .map_err(|_| AccountError::InvalidCredentials)?;

        let claims = build_claims(&user, TOKEN_TYPE_ACCESS, self.access_token_ttl);
        encode_token(&claims, &self.jwt_secret).map_err(AccountError::Internal)
    }
}
