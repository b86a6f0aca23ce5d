use std::time::Duration;

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, warn};

use shared_config::{AppConfig, MailTransport};

use crate::models::StatusNotification;

const MAIL_API_TIMEOUT: Duration = Duration::from_secs(10);

enum Transport {
    /// Direct SMTP relay.
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
    },
    /// Third-party HTTP email API with a bearer key.
    Api {
        client: Client,
        url: String,
        api_key: String,
    },
    Disabled,
}

/// Best-effort status-change mail. One attempt per transition, no retry;
/// every transport failure is logged and reported as `false`, never as an
/// error the caller has to handle.
pub struct EmailNotifier {
    transport: Transport,
    from: String,
}

impl EmailNotifier {
    pub fn new(config: &AppConfig) -> Self {
        let transport = match config.mail_transport {
            MailTransport::Smtp => Transport::Smtp {
                host: config.smtp_host.clone(),
                port: config.smtp_port,
                username: config.smtp_username.clone(),
                password: config.smtp_password.clone(),
            },
            MailTransport::Api => Transport::Api {
                client: Client::builder()
                    .timeout(MAIL_API_TIMEOUT)
                    .build()
                    .unwrap_or_default(),
                url: config.mail_api_url.clone(),
                api_key: config.mail_api_key.clone(),
            },
            MailTransport::Disabled => Transport::Disabled,
        };

        Self {
            transport,
            from: config.mail_from.clone(),
        }
    }

    /// Deliver the status-change message to the patient. Returns whether the
    /// transport accepted it.
    pub async fn send_status_email(&self, notification: &StatusNotification) -> bool {
        let recipient = notification.patient_email.trim();
        if recipient.is_empty() {
            debug!(
                "No patient email for appointment {}, skipping notification",
                notification.appointment_id
            );
            return false;
        }

        let (subject, body) = compose(notification);

        let delivered = match &self.transport {
            Transport::Smtp {
                host,
                port,
                username,
                password,
            } => {
                self.send_via_smtp(recipient, &subject, &body, host, *port, username, password)
                    .await
            }
            Transport::Api { client, url, api_key } => {
                self.send_via_api(client, url, api_key, recipient, &subject, &body)
                    .await
            }
            Transport::Disabled => {
                warn!("Mail transport disabled, dropping notification");
                Ok(false)
            }
        };

        match delivered {
            Ok(sent) => sent,
            Err(msg) => {
                error!(
                    "Failed to send appointment status email for appointment_id={}: {}",
                    notification.appointment_id, msg
                );
                false
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_via_smtp(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<bool, String> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| format!("invalid from address: {}", e))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| format!("invalid recipient address: {}", e))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| format!("failed to build message: {}", e))?;

        let mailer = if username.is_empty() {
            // Local relay without TLS or credentials.
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .port(port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| format!("failed to configure relay: {}", e))?
                .port(port)
                .credentials(Credentials::new(username.to_string(), password.to_string()))
                .build()
        };

        mailer
            .send(message)
            .await
            .map(|_| true)
            .map_err(|e| e.to_string())
    }

    async fn send_via_api(
        &self,
        client: &Client,
        url: &str,
        api_key: &str,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<bool, String> {
        let payload = json!({
            "from": self.from,
            "to": [recipient],
            "subject": subject,
            "text": body,
        });

        let response = client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("mail API returned {}: {}", status, error_text));
        }

        Ok(true)
    }
}

/// Fixed template shared by both transports.
pub fn compose(notification: &StatusNotification) -> (String, String) {
    let mut status_label = notification.status.clone();
    if let Some(first) = status_label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }

    let subject = format!("Appointment {}", status_label);
    let body = format!(
        "Hello {},\n\nYour appointment with Dr. {} on {} at {} was {}.\n\nThank you,\nCuraMind AI",
        notification.patient_username,
        notification.doctor_username,
        notification.date,
        notification.time,
        notification.status,
    );

    (subject, body)
}
