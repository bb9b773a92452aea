use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::{Uuid, Variant, Version};

use shared_database::DatabaseError;
use shared_models::error::AppError;

// ==============================================================================
// REQUESTS AND RESULTS
// ==============================================================================

/// Body of the booking-created trigger. The id is kept raw so malformed values
/// can be rejected with a proper error instead of a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingCreatedRequest {
    #[serde(rename = "bookingId", default)]
    pub booking_id: String,
}

/// A composed email ready to hand to the mail provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub patient_email_sent: bool,
    pub pharmacy_email_sent: bool,
}

/// Accepts only hyphenated, random (v4) RFC 4122 ids, which is what the
/// bookings table generates.
pub fn parse_booking_id(raw: &str) -> Result<Uuid, NotificationError> {
    if raw.len() != 36 {
        return Err(NotificationError::InvalidBookingId);
    }

    let id = Uuid::try_parse(raw).map_err(|_| NotificationError::InvalidBookingId)?;
    if id.get_version() != Some(Version::Random) || id.get_variant() != Variant::RFC4122 {
        return Err(NotificationError::InvalidBookingId);
    }

    Ok(id)
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Invalid booking ID format")]
    InvalidBookingId,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Confirmation window expired")]
    ConfirmationWindowExpired,

    #[error("Mail provider is not configured")]
    MailNotConfigured,

    #[error("Mail provider error: {0}")]
    Mail(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DatabaseError> for NotificationError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(_) => NotificationError::BookingNotFound,
            other => NotificationError::Database(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Mail(err.to_string())
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            e @ NotificationError::InvalidBookingId => AppError::BadRequest(e.to_string()),
            e @ NotificationError::BookingNotFound => AppError::NotFound(e.to_string()),
            e @ NotificationError::ConfirmationWindowExpired => AppError::Forbidden(e.to_string()),
            e @ NotificationError::MailNotConfigured => AppError::Unavailable(e.to_string()),
            NotificationError::Mail(msg) => AppError::ExternalService(msg),
            NotificationError::Database(msg) => AppError::Database(msg),
        }
    }
}
