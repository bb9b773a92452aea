use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use availability_cell::AvailabilityError;
use shared_database::DatabaseError;
use shared_models::error::{AppError, FieldError};
use shared_models::scheduling::{BookingStatus, Slot};

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH
        && EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(email))
}

// ==============================================================================
// PATIENT INPUT
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PatientDetails {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.first_name.trim().chars().count() < MIN_NAME_LENGTH {
            errors.push(FieldError::new("first_name", "First name must be at least 2 characters"));
        }
        if self.last_name.trim().chars().count() < MIN_NAME_LENGTH {
            errors.push(FieldError::new("last_name", "Last name must be at least 2 characters"));
        }
        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Please enter a valid email address"));
        }

        errors
    }

    /// Trimmed copy with blank optional fields collapsed to `None`.
    pub fn normalized(self) -> Self {
        fn optional(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: optional(self.phone),
            notes: optional(self.notes),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitBookingRequest {
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    #[serde(flatten)]
    pub patient: PatientDetails,
}

// ==============================================================================
// SLOT AVAILABILITY
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    #[serde(flatten)]
    pub slot: Slot,
    pub available: bool,
}

/// Resolved slots for one service and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySlots {
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
}

impl DaySlots {
    /// No rule covers this date at all.
    pub fn has_no_rules(&self) -> bool {
        self.slots.is_empty()
    }

    /// Rules exist but every slot is taken.
    pub fn fully_booked(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(|s| !s.available)
    }

    pub fn available_count(&self) -> usize {
        self.slots.iter().filter(|s| s.available).count()
    }
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// PORTAL
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid booking details")]
    Validation(Vec<FieldError>),

    #[error("This time slot is no longer available, please choose another time")]
    SlotUnavailable,

    #[error("{0}")]
    NotFound(String),

    #[error("Could not load availability, please try again: {0}")]
    TransientFetch(String),

    #[error("Cannot change booking from {from} to {to}")]
    InvalidStatusTransition { from: BookingStatus, to: BookingStatus },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DatabaseError> for BookingError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(_) => BookingError::SlotUnavailable,
            DatabaseError::NotFound(msg) => BookingError::NotFound(msg),
            DatabaseError::Transient(msg) => BookingError::TransientFetch(msg),
            other => BookingError::Database(other.to_string()),
        }
    }
}

impl From<AvailabilityError> for BookingError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Validation(fields) => BookingError::Validation(fields),
            AvailabilityError::NotFound(msg) => BookingError::NotFound(msg),
            AvailabilityError::TransientFetch(msg) => BookingError::TransientFetch(msg),
            other => BookingError::Database(other.to_string()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(fields) => AppError::ValidationError(fields),
            BookingError::SlotUnavailable => AppError::conflict(BookingError::SlotUnavailable.to_string()),
            BookingError::NotFound(msg) => AppError::NotFound(msg),
            BookingError::TransientFetch(msg) => AppError::Unavailable(msg),
            e @ BookingError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
            BookingError::Database(msg) => AppError::Database(msg),
        }
    }
}
