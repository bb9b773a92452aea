use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use availability_cell::generate_slots;
use shared_database::SchedulingStore;
use shared_models::scheduling::{Booking, BookingStatus, DayOfWeek, Slot};

use crate::models::{BookingError, DaySlots, SlotAvailability};

/// A slot is taken iff a slot-holding booking starts at exactly the same instant.
/// Slots that started before `now` are never offered.
pub fn mark_availability(slots: Vec<Slot>, bookings: &[Booking], now: DateTime<Utc>) -> Vec<SlotAvailability> {
    let taken: HashSet<DateTime<Utc>> = bookings
        .iter()
        .filter(|b| b.status.holds_slot())
        .map(|b| b.booking_start)
        .collect();

    slots
        .into_iter()
        .map(|slot| {
            let available = slot.start >= now && !taken.contains(&slot.start);
            SlotAvailability { slot, available }
        })
        .collect()
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Combines generated slots with the day's bookings. Read-only and advisory: a free
/// slot here is never a reservation.
pub struct SlotAvailabilityResolver {
    store: Arc<dyn SchedulingStore>,
}

impl SlotAvailabilityResolver {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, pharmacy_id: Uuid, service_id: Uuid, date: NaiveDate) -> Result<DaySlots, BookingError> {
        self.resolve_at(pharmacy_id, service_id, date, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn resolve_at(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DaySlots, BookingError> {
        let rules = self
            .store
            .list_active_rules(pharmacy_id, service_id, Some(DayOfWeek::of(date)))
            .await?;

        let slots = generate_slots(&rules, date);
        if slots.is_empty() {
            debug!("No slots for service {} on {}", service_id, date);
            return Ok(DaySlots { service_id, date, slots: vec![] });
        }

        let (day_start, day_end) = day_bounds(date);
        let bookings = self
            .store
            .list_bookings(pharmacy_id, service_id, day_start, day_end, Some(BookingStatus::Cancelled))
            .await?;

        let slots = mark_availability(slots, &bookings, now);
        debug!(
            "Service {} on {}: {} slots, {} bookings",
            service_id,
            date,
            slots.len(),
            bookings.len()
        );

        Ok(DaySlots { service_id, date, slots })
    }

    /// Entry point for the patient-facing flow, which only knows the service.
    pub async fn resolve_public(&self, service_id: Uuid, date: NaiveDate) -> Result<DaySlots, BookingError> {
        self.resolve_public_at(service_id, date, Utc::now()).await
    }

    pub async fn resolve_public_at(
        &self,
        service_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DaySlots, BookingError> {
        let service = self.store.get_service(service_id).await?;
        if !service.active() {
            return Err(BookingError::NotFound("Service not found".to_string()));
        }
        self.resolve_at(service.pharmacy_id, service_id, date, now).await
    }
}
