use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_models::pharmacy::{BookingDetails, EmailSettings};
use shared_models::scheduling::{
    AvailabilityRule, Booking, BookingStatus, DayOfWeek, NewAvailabilityRule, NewBooking,
    Pharmacist, PharmacyService,
};

use crate::error::DatabaseError;

pub type StoreResult<T> = Result<T, DatabaseError>;

/// Persistence boundary for the scheduling core.
///
/// Every tenant-owned read or write takes the owning `pharmacy_id` explicitly and
/// implementations must refuse to touch rows of any other pharmacy. The only
/// unscoped lookups are `get_service` (how a public booking flow discovers its
/// tenant) and `get_booking_details` (the notification path, which receives a
/// bare booking id).
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn get_service(&self, service_id: Uuid) -> StoreResult<PharmacyService>;

    async fn get_service_for_tenant(&self, pharmacy_id: Uuid, service_id: Uuid) -> StoreResult<PharmacyService>;

    async fn find_pharmacist_by_user(&self, user_id: Uuid) -> StoreResult<Option<Pharmacist>>;

    async fn get_pharmacist(&self, pharmacy_id: Uuid, pharmacist_id: Uuid) -> StoreResult<Pharmacist>;

    /// All rules of a service, active or not, ordered by day then start time.
    async fn list_rules(&self, pharmacy_id: Uuid, service_id: Uuid) -> StoreResult<Vec<AvailabilityRule>>;

    /// Active rules of a service ordered by start time, optionally for one day of week.
    async fn list_active_rules(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        day_of_week: Option<DayOfWeek>,
    ) -> StoreResult<Vec<AvailabilityRule>>;

    async fn get_rule(&self, pharmacy_id: Uuid, rule_id: Uuid) -> StoreResult<AvailabilityRule>;

    async fn insert_rules(&self, pharmacy_id: Uuid, rules: Vec<NewAvailabilityRule>) -> StoreResult<Vec<AvailabilityRule>>;

    async fn set_rule_active(&self, pharmacy_id: Uuid, rule_id: Uuid, is_active: bool) -> StoreResult<AvailabilityRule>;

    async fn delete_rule(&self, pharmacy_id: Uuid, rule_id: Uuid) -> StoreResult<()>;

    /// Bookings of a service whose `booking_start` lies in `[range_start, range_end)`.
    async fn list_bookings(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        exclude_status: Option<BookingStatus>,
    ) -> StoreResult<Vec<Booking>>;

    /// All bookings of a pharmacy, newest first.
    async fn list_pharmacy_bookings(&self, pharmacy_id: Uuid, status: Option<BookingStatus>) -> StoreResult<Vec<Booking>>;

    /// Atomic insert. Fails with `DatabaseError::Conflict` when another slot-holding booking
    /// already exists for the same (service, staff-or-none, booking_start).
    async fn insert_booking(&self, pharmacy_id: Uuid, booking: NewBooking) -> StoreResult<Booking>;

    async fn get_booking(&self, pharmacy_id: Uuid, booking_id: Uuid) -> StoreResult<Booking>;

    async fn update_booking_status(&self, pharmacy_id: Uuid, booking_id: Uuid, status: BookingStatus) -> StoreResult<Booking>;

    async fn get_booking_details(&self, booking_id: Uuid) -> StoreResult<BookingDetails>;

    async fn get_email_settings(&self, pharmacy_id: Uuid) -> StoreResult<Option<EmailSettings>>;
}
