use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::scheduling::{Booking, BookingStatus};

use crate::models::BookingError;

/// Statuses a booking may move to from `current`. Cancelled and no-show are terminal.
pub fn valid_transitions(current: BookingStatus) -> &'static [BookingStatus] {
    match current {
        BookingStatus::Pending => &[
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
        ],
        BookingStatus::Confirmed => &[BookingStatus::Cancelled, BookingStatus::NoShow],
        BookingStatus::Cancelled | BookingStatus::NoShow => &[],
    }
}

pub fn validate_status_transition(current: BookingStatus, next: BookingStatus) -> Result<(), BookingError> {
    if !valid_transitions(current).contains(&next) {
        warn!("Invalid booking status transition attempted: {} -> {}", current, next);
        return Err(BookingError::InvalidStatusTransition { from: current, to: next });
    }
    Ok(())
}

/// Staff-side booking management, scoped to one pharmacy per call.
pub struct BookingLifecycleService {
    store: Arc<dyn SchedulingStore>,
}

impl BookingLifecycleService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn list_bookings(&self, pharmacy_id: Uuid, status: Option<BookingStatus>) -> Result<Vec<Booking>, BookingError> {
        let bookings = self.store.list_pharmacy_bookings(pharmacy_id, status).await?;
        debug!("Loaded {} bookings for pharmacy {}", bookings.len(), pharmacy_id);
        Ok(bookings)
    }

    pub async fn update_status(&self, pharmacy_id: Uuid, booking_id: Uuid, next: BookingStatus) -> Result<Booking, BookingError> {
        let booking = self.store.get_booking(pharmacy_id, booking_id).await?;
        validate_status_transition(booking.status, next)?;

        let updated = self.store.update_booking_status(pharmacy_id, booking_id, next).await?;
        info!("Booking {} moved {} -> {}", booking_id, booking.status, next);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn pending_can_go_anywhere_but_pending() {
        for next in [BookingStatus::Confirmed, BookingStatus::Cancelled, BookingStatus::NoShow] {
            assert!(validate_status_transition(BookingStatus::Pending, next).is_ok());
        }
        assert_matches!(
            validate_status_transition(BookingStatus::Pending, BookingStatus::Pending),
            Err(BookingError::InvalidStatusTransition { .. })
        );
    }

    #[test]
    fn confirmed_cannot_return_to_pending() {
        assert!(validate_status_transition(BookingStatus::Confirmed, BookingStatus::NoShow).is_ok());
        assert!(validate_status_transition(BookingStatus::Confirmed, BookingStatus::Pending).is_err());
    }

    #[test]
    fn terminal_statuses_are_final() {
        assert!(valid_transitions(BookingStatus::Cancelled).is_empty());
        assert!(valid_transitions(BookingStatus::NoShow).is_empty());
        assert!(validate_status_transition(BookingStatus::Cancelled, BookingStatus::Confirmed).is_err());
    }
}
