use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ==============================================================================
// DAY OF WEEK
// ==============================================================================

/// Day of week as stored by the backend: 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(u8);

const DAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

impl DayOfWeek {
    pub const SUNDAY: DayOfWeek = DayOfWeek(0);
    pub const MONDAY: DayOfWeek = DayOfWeek(1);
    pub const TUESDAY: DayOfWeek = DayOfWeek(2);
    pub const WEDNESDAY: DayOfWeek = DayOfWeek(3);
    pub const THURSDAY: DayOfWeek = DayOfWeek(4);
    pub const FRIDAY: DayOfWeek = DayOfWeek(5);
    pub const SATURDAY: DayOfWeek = DayOfWeek(6);

    pub fn new(value: u8) -> Option<Self> {
        (value <= 6).then_some(DayOfWeek(value))
    }

    pub fn of(date: NaiveDate) -> Self {
        DayOfWeek(date.weekday().num_days_from_sunday() as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        DAY_NAMES[self.0 as usize]
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DayOfWeek::new(value)
            .ok_or_else(|| format!("Day of week must be between 0 (Sunday) and 6 (Saturday), got {}", value))
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ==============================================================================
// SERVICES AND STAFF
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffName {
    pub first_name: String,
    pub last_name: String,
}

impl StaffName {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub name: String,
}

/// A bookable service offered by one pharmacy (tenant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmacyService {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    #[serde(default)]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, rename = "service_catalogue", skip_serializing_if = "Option::is_none")]
    pub catalogue: Option<CatalogueEntry>,
}

impl PharmacyService {
    pub fn display_name(&self) -> String {
        self.custom_title
            .clone()
            .filter(|title| !title.trim().is_empty())
            .or_else(|| self.catalogue.as_ref().map(|c| c.name.clone()))
            .unwrap_or_else(|| "Appointment".to_string())
    }

    pub fn active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }
}

/// A staff member (pharmacist) belonging to a pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pharmacist {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ==============================================================================
// AVAILABILITY RULES
// ==============================================================================

pub const MIN_SLOT_LENGTH_MINUTES: u32 = 5;
pub const MAX_SLOT_LENGTH_MINUTES: u32 = 240;
pub const MIN_BOOKINGS_PER_SLOT: u32 = 1;
pub const MAX_BOOKINGS_PER_SLOT: u32 = 20;

/// Recurring weekly availability window for a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    #[serde(rename = "pharmacy_service_id")]
    pub service_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_length_minutes: u32,
    #[serde(default)]
    pub max_bookings_per_slot: Option<u32>,
    #[serde(default, rename = "pharmacist_id")]
    pub staff_id: Option<Uuid>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, rename = "pharmacists", skip_serializing_if = "Option::is_none")]
    pub staff: Option<StaffName>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AvailabilityRule {
    pub fn active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    pub fn capacity(&self) -> u32 {
        self.max_bookings_per_slot.unwrap_or(MIN_BOOKINGS_PER_SLOT)
    }

    pub fn staff_name(&self) -> Option<String> {
        self.staff.as_ref().map(StaffName::full_name)
    }
}

/// Insert payload for one rule; a multi-day draft produces one per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAvailabilityRule {
    #[serde(rename = "pharmacy_service_id")]
    pub service_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_length_minutes: u32,
    pub max_bookings_per_slot: u32,
    #[serde(rename = "pharmacist_id")]
    pub staff_id: Option<Uuid>,
    pub is_active: bool,
}

// ==============================================================================
// SLOTS
// ==============================================================================

/// One bookable unit derived from a rule for a concrete date. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub rule_id: Uuid,
    pub staff_id: Option<Uuid>,
}

// ==============================================================================
// BOOKINGS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }

    /// Whether a booking in this status still holds its slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "no_show" => Ok(BookingStatus::NoShow),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

// The status column is nullable; a missing value means the booking was never reviewed.
fn status_or_pending<'de, D>(deserializer: D) -> Result<BookingStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BookingStatus>::deserialize(deserializer)?.unwrap_or_default())
}

pub const WEB_BOOKING_SOURCE: &str = "web";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub pharmacy_id: Uuid,
    #[serde(rename = "pharmacy_service_id")]
    pub service_id: Uuid,
    #[serde(default, rename = "pharmacist_id")]
    pub staff_id: Option<Uuid>,
    pub booking_start: DateTime<Utc>,
    pub booking_end: DateTime<Utc>,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_email: String,
    #[serde(default)]
    pub patient_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "status_or_pending")]
    pub status: BookingStatus,
    #[serde(default)]
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn patient_full_name(&self) -> String {
        format!("{} {}", self.patient_first_name, self.patient_last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub pharmacy_id: Uuid,
    #[serde(rename = "pharmacy_service_id")]
    pub service_id: Uuid,
    #[serde(rename = "pharmacist_id")]
    pub staff_id: Option<Uuid>,
    pub booking_start: DateTime<Utc>,
    pub booking_end: DateTime<Utc>,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn day_of_week_follows_sunday_zero_convention() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();

        assert_eq!(DayOfWeek::of(monday), DayOfWeek::MONDAY);
        assert_eq!(DayOfWeek::of(sunday), DayOfWeek::SUNDAY);
        assert_eq!(DayOfWeek::TUESDAY.name(), "Tuesday");
        assert!(DayOfWeek::new(7).is_none());
    }

    #[test]
    fn rule_decodes_from_backend_row() {
        let row = json!({
            "id": Uuid::new_v4(),
            "pharmacy_service_id": Uuid::new_v4(),
            "day_of_week": 2,
            "start_time": "09:00:00",
            "end_time": "17:00:00",
            "slot_length_minutes": 30,
            "max_bookings_per_slot": null,
            "pharmacist_id": null,
            "is_active": true,
            "pharmacists": { "first_name": "Ada", "last_name": "Okafor" },
            "created_at": "2024-06-01T10:00:00+00:00",
            "updated_at": "2024-06-01T10:00:00+00:00"
        });

        let rule: AvailabilityRule = serde_json::from_value(row).unwrap();
        assert_eq!(rule.day_of_week, DayOfWeek::TUESDAY);
        assert_eq!(rule.capacity(), 1);
        assert_eq!(rule.staff_name().as_deref(), Some("Ada Okafor"));
    }

    #[test]
    fn day_of_week_out_of_range_is_rejected() {
        let row = json!({
            "id": Uuid::new_v4(),
            "pharmacy_service_id": Uuid::new_v4(),
            "day_of_week": 9,
            "start_time": "09:00:00",
            "end_time": "17:00:00",
            "slot_length_minutes": 30
        });

        assert!(serde_json::from_value::<AvailabilityRule>(row).is_err());
    }

    #[test]
    fn null_booking_status_reads_as_pending() {
        let row = json!({
            "id": Uuid::new_v4(),
            "pharmacy_id": Uuid::new_v4(),
            "pharmacy_service_id": Uuid::new_v4(),
            "booking_start": "2024-06-10T09:00:00+00:00",
            "booking_end": "2024-06-10T09:30:00+00:00",
            "patient_first_name": "Jo",
            "patient_last_name": "Bloggs",
            "patient_email": "jo@example.com",
            "status": null,
            "created_at": "2024-06-01T10:00:00+00:00",
            "updated_at": "2024-06-01T10:00:00+00:00"
        });

        let booking: Booking = serde_json::from_value(row).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(booking.status.holds_slot());
    }
}
