use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use shared_models::scheduling::{Booking, Slot};

use crate::models::SlotAvailability;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: &'static str, action: &'static str },

    #[error("Selected slot is not on {0}")]
    SlotNotOnDate(NaiveDate),

    #[error("Selected slot is already taken")]
    SlotTaken,

    #[error("Booking does not match the selected slot")]
    BookingMismatch,
}

/// Steps of the patient booking flow. Each transition consumes the current state.
///
/// This is the typed contract for client-held wizard state. The server keeps no flow
/// state and the handlers never construct it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum BookingFlow {
    #[default]
    SelectingDate,
    SelectingTime { date: NaiveDate },
    EnteringDetails { date: NaiveDate, slot: Slot },
    Confirmed { booking: Box<BookingSummary> },
}

/// What the confirmation step shows; patient contact details stay server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingSummary {
    pub booking_id: uuid::Uuid,
    pub slot: Slot,
    pub patient_name: String,
}

impl BookingFlow {
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&self) -> &'static str {
        match self {
            BookingFlow::SelectingDate => "selecting a date",
            BookingFlow::SelectingTime { .. } => "selecting a time",
            BookingFlow::EnteringDetails { .. } => "entering details",
            BookingFlow::Confirmed { .. } => "confirmed",
        }
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidTransition { state: self.name(), action }
    }

    /// Picks (or changes) the date. Allowed until details are being entered.
    pub fn select_date(self, date: NaiveDate) -> Result<Self, FlowError> {
        match self {
            BookingFlow::SelectingDate | BookingFlow::SelectingTime { .. } => {
                Ok(BookingFlow::SelectingTime { date })
            }
            other => Err(other.invalid("select a date")),
        }
    }

    pub fn select_time(self, choice: &SlotAvailability) -> Result<Self, FlowError> {
        match self {
            BookingFlow::SelectingTime { date } => {
                if choice.slot.start.date_naive() != date {
                    return Err(FlowError::SlotNotOnDate(date));
                }
                if !choice.available {
                    return Err(FlowError::SlotTaken);
                }
                Ok(BookingFlow::EnteringDetails { date, slot: choice.slot.clone() })
            }
            other => Err(other.invalid("select a time")),
        }
    }

    pub fn confirm(self, booking: &Booking) -> Result<Self, FlowError> {
        match self {
            BookingFlow::EnteringDetails { slot, .. } => {
                if booking.booking_start != slot.start {
                    return Err(FlowError::BookingMismatch);
                }
                Ok(BookingFlow::Confirmed {
                    booking: Box::new(BookingSummary {
                        booking_id: booking.id,
                        slot,
                        patient_name: booking.patient_full_name(),
                    }),
                })
            }
            other => Err(other.invalid("confirm")),
        }
    }

    pub fn back(self) -> Result<Self, FlowError> {
        match self {
            BookingFlow::SelectingTime { .. } => Ok(BookingFlow::SelectingDate),
            BookingFlow::EnteringDetails { date, .. } => Ok(BookingFlow::SelectingTime { date }),
            other => Err(other.invalid("go back")),
        }
    }

    /// Starts a fresh booking after a confirmation.
    pub fn restart(self) -> Result<Self, FlowError> {
        match self {
            BookingFlow::Confirmed { .. } => Ok(BookingFlow::SelectingDate),
            other => Err(other.invalid("start over")),
        }
    }
}
