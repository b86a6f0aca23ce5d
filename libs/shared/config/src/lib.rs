use std::env;
use tracing::warn;

/// Which transport the notification dispatcher uses for outbound mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTransport {
    /// Direct SMTP relay.
    Smtp,
    /// Third-party HTTP email API.
    Api,
    /// Mail disabled; every dispatch attempt reports failure.
    Disabled,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_rest_url: String,
    pub database_service_key: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub mail_transport: MailTransport,
    pub mail_from: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            database_rest_url: env::var("DATABASE_REST_URL")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_REST_URL not set, using empty value");
                    String::new()
                }),
            database_service_key: env::var("DATABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("DATABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            access_token_ttl_minutes: parse_env_number("ACCESS_TOKEN_TTL_MINUTES", 60),
            refresh_token_ttl_days: parse_env_number("REFRESH_TOKEN_TTL_DAYS", 7),
            mail_transport: match env::var("MAIL_TRANSPORT").as_deref() {
                Ok("smtp") => MailTransport::Smtp,
                Ok("api") => MailTransport::Api,
                Ok(other) => {
                    warn!("MAIL_TRANSPORT '{}' not recognized, mail disabled", other);
                    MailTransport::Disabled
                }
                Err(_) => {
                    warn!("MAIL_TRANSPORT not set, mail disabled");
                    MailTransport::Disabled
                }
            },
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "CuraMind AI <no-reply@curamind.local>".to_string()),
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: parse_env_number("SMTP_PORT", 587) as u16,
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.database_rest_url.is_empty()
            && !self.database_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        match self.mail_transport {
            MailTransport::Smtp => !self.smtp_host.is_empty(),
            MailTransport::Api => !self.mail_api_url.is_empty() && !self.mail_api_key.is_empty(),
            MailTransport::Disabled => false,
        }
    }
}

fn parse_env_number(name: &str, default: i64) -> i64 {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a number, using default {}", name, default);
            default
        }),
        Err(_) => default,
    }
}
