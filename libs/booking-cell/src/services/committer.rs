use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::error::FieldError;
use shared_models::scheduling::{Booking, BookingStatus, NewBooking, WEB_BOOKING_SOURCE};
use shared_utils::BookingNotifier;

use crate::models::{BookingError, CommitBookingRequest};
use crate::services::resolver::SlotAvailabilityResolver;

/// Commits patient bookings.
///
/// The store's atomic insert is the only synchronization point. The availability
/// re-check before it only turns an obviously stale pick into an early conflict.
pub struct BookingCommitter {
    store: Arc<dyn SchedulingStore>,
    notifier: Arc<dyn BookingNotifier>,
}

impl BookingCommitter {
    pub fn new(store: Arc<dyn SchedulingStore>, notifier: Arc<dyn BookingNotifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn commit(&self, service_id: Uuid, request: CommitBookingRequest) -> Result<Booking, BookingError> {
        self.commit_at(service_id, request, Utc::now()).await
    }

    #[instrument(skip(self, request), fields(slot_start = %request.slot_start))]
    pub async fn commit_at(
        &self,
        service_id: Uuid,
        request: CommitBookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let patient = request.patient.normalized();
        let mut errors = patient.validate();
        if request.slot_end <= request.slot_start {
            errors.push(FieldError::new("slot_end", "Slot must end after it starts"));
        } else if request.slot_start < now {
            errors.push(FieldError::new("slot_start", "Selected time has already passed"));
        }
        if !errors.is_empty() {
            return Err(BookingError::Validation(errors));
        }

        let service = self.store.get_service(service_id).await?;
        if !service.active() {
            return Err(BookingError::NotFound("Service not found".to_string()));
        }
        let pharmacy_id = service.pharmacy_id;

        let day = SlotAvailabilityResolver::new(self.store.clone())
            .resolve_at(pharmacy_id, service_id, request.slot_start.date_naive(), now)
            .await?;

        let chosen = day
            .slots
            .iter()
            .find(|s| s.slot.start == request.slot_start && s.slot.end == request.slot_end)
            .ok_or_else(|| BookingError::Validation(vec![FieldError::new(
                "slot_start",
                "Selected time is not a bookable slot for this service",
            )]))?;

        if !chosen.available {
            info!("Slot {} for service {} already taken", request.slot_start, service_id);
            return Err(BookingError::SlotUnavailable);
        }

        let booking = NewBooking {
            pharmacy_id,
            service_id,
            staff_id: chosen.slot.staff_id,
            booking_start: chosen.slot.start,
            booking_end: chosen.slot.end,
            patient_first_name: patient.first_name,
            patient_last_name: patient.last_name,
            patient_email: patient.email,
            patient_phone: patient.phone,
            notes: patient.notes,
            status: BookingStatus::Pending,
            source: WEB_BOOKING_SOURCE.to_string(),
        };

        let created = self.store.insert_booking(pharmacy_id, booking).await.map_err(|e| {
            if matches!(e, shared_database::DatabaseError::Conflict(_)) {
                info!("Lost race for slot {} on service {}", request.slot_start, service_id);
            }
            BookingError::from(e)
        })?;

        info!("Booking {} created for service {}", created.id, service_id);
        self.dispatch_notification(created.id);

        Ok(created)
    }

    fn dispatch_notification(&self, booking_id: Uuid) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.booking_created(booking_id).await {
                warn!("Booking notification for {} failed: {}", booking_id, e);
            }
        });
    }
}
