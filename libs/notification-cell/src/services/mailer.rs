use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{EmailMessage, NotificationError};

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message and returns the provider's message id.
    async fn send(&self, message: &EmailMessage) -> Result<String, NotificationError>;
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

/// Resend HTTP API client.
/// POST {base_url}/emails
pub struct ResendMailer {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ResendMailer {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_mail_configured() {
            return Err(NotificationError::MailNotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.resend_api_key.clone(),
            base_url: config.resend_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, NotificationError> {
        let url = format!("{}/emails", self.base_url);
        debug!("Sending email '{}' to {} recipient(s)", message.subject, message.to.len());

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(message)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("Resend send failed: {} - {}", status, response_text);
            return Err(NotificationError::Mail(format!("HTTP {}: {}", status, response_text)));
        }

        let sent: ResendResponse = serde_json::from_str(&response_text)
            .map_err(|e| NotificationError::Mail(format!("Failed to parse send response: {}", e)))?;

        Ok(sent.id)
    }
}
