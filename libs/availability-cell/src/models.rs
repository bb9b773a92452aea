use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::error::{AppError, FieldError};
use shared_models::scheduling::{
    AvailabilityRule, DayOfWeek, NewAvailabilityRule, MAX_BOOKINGS_PER_SLOT,
    MAX_SLOT_LENGTH_MINUTES, MIN_BOOKINGS_PER_SLOT, MIN_SLOT_LENGTH_MINUTES,
};

pub const DEFAULT_SLOT_LENGTH_MINUTES: u32 = 30;
pub const DEFAULT_BOOKINGS_PER_SLOT: u32 = 1;
pub const MAX_HORIZON_DAYS: u32 = 365;

// ==============================================================================
// RULE DRAFTS
// ==============================================================================

fn default_slot_length() -> u32 {
    DEFAULT_SLOT_LENGTH_MINUTES
}

fn default_capacity() -> u32 {
    DEFAULT_BOOKINGS_PER_SLOT
}

/// A rule as submitted by staff: one window applied to several days at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDraft {
    pub days: Vec<u8>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_slot_length")]
    pub slot_length_minutes: u32,
    #[serde(default = "default_capacity")]
    pub max_bookings_per_slot: u32,
    #[serde(default)]
    pub staff_id: Option<Uuid>,
}

impl RuleDraft {
    /// Field-level checks that need no stored data.
    pub fn validate(&self) -> Result<Vec<DayOfWeek>, AvailabilityError> {
        let mut errors = Vec::new();

        if self.days.is_empty() {
            errors.push(FieldError::new("days", "Select at least one day"));
        }
        if let Some(bad) = self.days.iter().find(|d| DayOfWeek::new(**d).is_none()) {
            errors.push(FieldError::new(
                "days",
                format!("Day of week must be between 0 (Sunday) and 6 (Saturday), got {}", bad),
            ));
        }
        if self.end_time <= self.start_time {
            errors.push(FieldError::new("end_time", "End time must be after start time"));
        }
        if !(MIN_SLOT_LENGTH_MINUTES..=MAX_SLOT_LENGTH_MINUTES).contains(&self.slot_length_minutes) {
            errors.push(FieldError::new(
                "slot_length_minutes",
                format!(
                    "Slot length must be between {} and {} minutes",
                    MIN_SLOT_LENGTH_MINUTES, MAX_SLOT_LENGTH_MINUTES
                ),
            ));
        }
        if !(MIN_BOOKINGS_PER_SLOT..=MAX_BOOKINGS_PER_SLOT).contains(&self.max_bookings_per_slot) {
            errors.push(FieldError::new(
                "max_bookings_per_slot",
                format!(
                    "Bookings per slot must be between {} and {}",
                    MIN_BOOKINGS_PER_SLOT, MAX_BOOKINGS_PER_SLOT
                ),
            ));
        }

        if !errors.is_empty() {
            return Err(AvailabilityError::Validation(errors));
        }

        let mut days: Vec<DayOfWeek> = self.days.iter().filter_map(|d| DayOfWeek::new(*d)).collect();
        days.sort();
        days.dedup();
        Ok(days)
    }

    pub fn into_new_rules(self, service_id: Uuid, days: &[DayOfWeek]) -> Vec<NewAvailabilityRule> {
        days.iter()
            .map(|day| NewAvailabilityRule {
                service_id,
                day_of_week: *day,
                start_time: self.start_time,
                end_time: self.end_time,
                slot_length_minutes: self.slot_length_minutes,
                max_bookings_per_slot: self.max_bookings_per_slot,
                staff_id: self.staff_id,
                is_active: true,
            })
            .collect()
    }
}

/// An existing active rule that a draft would overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConflict {
    pub rule_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub day_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub staff_id: Option<Uuid>,
    pub staff_name: Option<String>,
}

impl RuleConflict {
    pub fn from_rule(rule: &AvailabilityRule) -> Self {
        Self {
            rule_id: rule.id,
            day_of_week: rule.day_of_week,
            day_name: rule.day_of_week.name().to_string(),
            start_time: rule.start_time,
            end_time: rule.end_time,
            staff_id: rule.staff_id,
            staff_name: rule.staff_name(),
        }
    }

    pub fn describe(&self) -> String {
        let who = self.staff_name.as_deref().unwrap_or("any pharmacist");
        format!(
            "{} {}-{} ({})",
            self.day_name,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M"),
            who
        )
    }
}

// ==============================================================================
// REQUESTS AND RESPONSES
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailableDatesQuery {
    pub horizon_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableDates {
    pub service_id: Uuid,
    pub from: NaiveDate,
    pub horizon_days: u32,
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRuleRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftValidation {
    pub valid: bool,
    pub conflicts: Vec<RuleConflict>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Invalid availability rule")]
    Validation(Vec<FieldError>),

    #[error("Rule overlaps {} existing availability window(s)", .0.len())]
    RuleConflicts(Vec<RuleConflict>),

    #[error("{0}")]
    NotFound(String),

    #[error("Could not load availability, please try again: {0}")]
    TransientFetch(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DatabaseError> for AvailabilityError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => AvailabilityError::NotFound(msg),
            DatabaseError::Transient(msg) => AvailabilityError::TransientFetch(msg),
            other => AvailabilityError::Database(other.to_string()),
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Validation(fields) => AppError::ValidationError(fields),
            AvailabilityError::RuleConflicts(conflicts) => AppError::Conflict {
                message: format!(
                    "Availability overlaps existing rules: {}",
                    conflicts.iter().map(RuleConflict::describe).collect::<Vec<_>>().join("; ")
                ),
                details: Some(json!(conflicts)),
            },
            AvailabilityError::NotFound(msg) => AppError::NotFound(msg),
            AvailabilityError::TransientFetch(msg) => AppError::Unavailable(msg),
            AvailabilityError::Database(msg) => AppError::Database(msg),
        }
    }
}
