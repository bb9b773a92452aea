use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification transport failed: {0}")]
    Transport(String),

    #[error("Notification rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Trigger fired after a booking is committed.
///
/// Callers never wait on the outcome for the booking result; failures are only logged.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn booking_created(&self, booking_id: Uuid) -> Result<(), NotifyError>;
}

/// Drops every trigger. Used when no dispatcher is wired in.
pub struct NoopNotifier;

#[async_trait]
impl BookingNotifier for NoopNotifier {
    async fn booking_created(&self, booking_id: Uuid) -> Result<(), NotifyError> {
        debug!("Notification disabled, skipping booking {}", booking_id);
        Ok(())
    }
}

/// POSTs `{ "bookingId": .. }` to a remote booking-created endpoint.
pub struct HttpNotifier {
    client: Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl BookingNotifier for HttpNotifier {
    async fn booking_created(&self, booking_id: Uuid) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "bookingId": booking_id }))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Booking notification for {} rejected: {} {}", booking_id, status, body);
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }

        debug!("Booking notification sent for {}", booking_id);
        Ok(())
    }
}
