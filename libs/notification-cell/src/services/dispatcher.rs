use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::pharmacy::{BookingDetails, EmailSettings};
use shared_utils::{BookingNotifier, NotifyError};

use crate::models::{parse_booking_id, DispatchReport, EmailMessage, NotificationError};
use crate::services::mailer::Mailer;
use crate::services::templates;

/// Sends the patient confirmation and pharmacy notification for a freshly
/// created booking. Only the booking id is trusted; everything else is re-read.
pub struct NotificationDispatcher {
    store: Arc<dyn SchedulingStore>,
    mailer: Arc<dyn Mailer>,
    mail_from: String,
    window: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        mailer: Arc<dyn Mailer>,
        mail_from: impl Into<String>,
        window_minutes: i64,
    ) -> Self {
        Self {
            store,
            mailer,
            mail_from: mail_from.into(),
            window: Duration::minutes(window_minutes),
        }
    }

    pub async fn dispatch(&self, raw_booking_id: &str) -> Result<DispatchReport, NotificationError> {
        self.dispatch_at(raw_booking_id, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn dispatch_at(
        &self,
        raw_booking_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DispatchReport, NotificationError> {
        let booking_id = parse_booking_id(raw_booking_id).inspect_err(|_| {
            warn!("Rejected notification request with malformed booking id");
        })?;

        let details = self.store.get_booking_details(booking_id).await?;
        if details.booking.created_at < now - self.window {
            warn!("Notification requested for old booking {}", booking_id);
            return Err(NotificationError::ConfirmationWindowExpired);
        }

        let settings = self
            .store
            .get_email_settings(details.booking.pharmacy_id)
            .await?
            .unwrap_or_else(|| EmailSettings {
                pharmacy_id: details.booking.pharmacy_id,
                ..EmailSettings::default()
            });

        let mut report = DispatchReport::default();

        if settings.patient_confirmation_enabled() {
            report.patient_email_sent = self.send_patient_confirmation(&details).await;
        }

        if settings.pharmacy_notification_enabled() {
            match pharmacy_recipients(&details, &settings) {
                Some(to) => report.pharmacy_email_sent = self.send_pharmacy_notification(&details, to).await,
                None => info!("No pharmacy notification email configured for booking {}", booking_id),
            }
        }

        Ok(report)
    }

    async fn send_patient_confirmation(&self, details: &BookingDetails) -> bool {
        let email = templates::patient_confirmation(details);
        let message = EmailMessage {
            from: self.mail_from.clone(),
            to: vec![details.booking.patient_email.clone()],
            subject: email.subject,
            html: email.html,
        };

        match self.mailer.send(&message).await {
            Ok(id) => {
                info!("Patient confirmation sent for booking {} ({})", details.booking.id, id);
                true
            }
            Err(e) => {
                error!("Error sending patient email for booking {}: {}", details.booking.id, e);
                false
            }
        }
    }

    async fn send_pharmacy_notification(&self, details: &BookingDetails, to: Vec<String>) -> bool {
        let email = templates::pharmacy_notification(details);
        let message = EmailMessage {
            from: self.mail_from.clone(),
            to,
            subject: email.subject,
            html: email.html,
        };

        match self.mailer.send(&message).await {
            Ok(id) => {
                info!("Pharmacy notification sent for booking {} ({})", details.booking.id, id);
                true
            }
            Err(e) => {
                error!("Error sending pharmacy notification for booking {}: {}", details.booking.id, e);
                false
            }
        }
    }
}

/// Configured notification address (or the pharmacy's primary email), plus the cc.
fn pharmacy_recipients(details: &BookingDetails, settings: &EmailSettings) -> Option<Vec<String>> {
    let primary = settings
        .booking_notification_email
        .clone()
        .filter(|e| !e.trim().is_empty())
        .or_else(|| details.pharmacy.primary_email.clone().filter(|e| !e.trim().is_empty()))?;

    let mut to = vec![primary];
    if let Some(cc) = settings.cc_email.clone().filter(|e| !e.trim().is_empty()) {
        to.push(cc);
    }
    Some(to)
}

/// In-process trigger: the booking flow calls the dispatcher directly instead
/// of POSTing to the notification endpoint.
#[async_trait]
impl BookingNotifier for NotificationDispatcher {
    async fn booking_created(&self, booking_id: Uuid) -> Result<(), NotifyError> {
        self.dispatch(&booking_id.to_string())
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }
}
