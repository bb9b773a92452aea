use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::pharmacy::{BookedService, BookingDetails, EmailSettings, Pharmacy};
use shared_models::scheduling::{
    AvailabilityRule, Booking, BookingStatus, DayOfWeek, NewAvailabilityRule, NewBooking,
    Pharmacist, PharmacyService, StaffName,
};

use crate::error::DatabaseError;
use crate::store::{SchedulingStore, StoreResult};

#[derive(Default)]
struct Tables {
    pharmacies: HashMap<Uuid, Pharmacy>,
    services: HashMap<Uuid, PharmacyService>,
    pharmacists: HashMap<Uuid, Pharmacist>,
    rules: Vec<AvailabilityRule>,
    bookings: Vec<Booking>,
    email_settings: HashMap<Uuid, EmailSettings>,
}

impl Tables {
    fn service_owned(&self, pharmacy_id: Uuid, service_id: Uuid) -> bool {
        self.services
            .get(&service_id)
            .is_some_and(|s| s.pharmacy_id == pharmacy_id)
    }

    fn staff_name(&self, staff_id: Option<Uuid>) -> Option<StaffName> {
        staff_id
            .and_then(|id| self.pharmacists.get(&id))
            .map(|p| StaffName {
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
            })
    }
}

/// Process-local `SchedulingStore`.
///
/// Backs the test suites and local development without a Supabase project. All writes
/// happen under one lock, so the booking uniqueness check and insert are atomic.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    fail_reads: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent read fail with a transient error until switched off.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DatabaseError::Transient("Simulated read failure".to_string()));
        }
        Ok(())
    }

    pub async fn seed_pharmacy(&self, name: &str, primary_email: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        let pharmacy = Pharmacy {
            id: Some(id),
            name: name.to_string(),
            primary_email: primary_email.map(str::to_string),
            address_line1: Some("1 High Street".to_string()),
            city: Some("Leeds".to_string()),
            postcode: Some("LS1 1AA".to_string()),
            phone: Some("0113 000 0000".to_string()),
        };
        self.tables.write().await.pharmacies.insert(id, pharmacy);
        id
    }

    pub async fn seed_service(&self, pharmacy_id: Uuid, title: &str) -> PharmacyService {
        let service = PharmacyService {
            id: Uuid::new_v4(),
            pharmacy_id,
            custom_title: Some(title.to_string()),
            is_active: Some(true),
            catalogue: None,
        };
        self.tables.write().await.services.insert(service.id, service.clone());
        service
    }

    pub async fn seed_pharmacist(&self, pharmacy_id: Uuid, user_id: Option<Uuid>, first_name: &str, last_name: &str) -> Pharmacist {
        let pharmacist = Pharmacist {
            id: Uuid::new_v4(),
            pharmacy_id,
            user_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_active: Some(true),
        };
        self.tables.write().await.pharmacists.insert(pharmacist.id, pharmacist.clone());
        pharmacist
    }

    pub async fn seed_email_settings(&self, settings: EmailSettings) {
        self.tables.write().await.email_settings.insert(settings.pharmacy_id, settings);
    }

    /// Stores a booking row as-is, bypassing the uniqueness check.
    pub async fn seed_booking(&self, booking: Booking) {
        self.tables.write().await.bookings.push(booking);
    }

    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn get_service(&self, service_id: Uuid) -> StoreResult<PharmacyService> {
        self.check_reads()?;
        self.tables
            .read()
            .await
            .services
            .get(&service_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("Service not found".to_string()))
    }

    async fn get_service_for_tenant(&self, pharmacy_id: Uuid, service_id: Uuid) -> StoreResult<PharmacyService> {
        self.check_reads()?;
        self.tables
            .read()
            .await
            .services
            .get(&service_id)
            .filter(|s| s.pharmacy_id == pharmacy_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("Service not found".to_string()))
    }

    async fn find_pharmacist_by_user(&self, user_id: Uuid) -> StoreResult<Option<Pharmacist>> {
        self.check_reads()?;
        Ok(self
            .tables
            .read()
            .await
            .pharmacists
            .values()
            .find(|p| p.user_id == Some(user_id) && p.is_active != Some(false))
            .cloned())
    }

    async fn get_pharmacist(&self, pharmacy_id: Uuid, pharmacist_id: Uuid) -> StoreResult<Pharmacist> {
        self.check_reads()?;
        self.tables
            .read()
            .await
            .pharmacists
            .get(&pharmacist_id)
            .filter(|p| p.pharmacy_id == pharmacy_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("Pharmacist not found".to_string()))
    }

    async fn list_rules(&self, pharmacy_id: Uuid, service_id: Uuid) -> StoreResult<Vec<AvailabilityRule>> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        if !tables.service_owned(pharmacy_id, service_id) {
            return Ok(vec![]);
        }

        let mut rules: Vec<AvailabilityRule> = tables
            .rules
            .iter()
            .filter(|r| r.service_id == service_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| (r.day_of_week, r.start_time));
        Ok(rules)
    }

    async fn list_active_rules(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        day_of_week: Option<DayOfWeek>,
    ) -> StoreResult<Vec<AvailabilityRule>> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        if !tables.service_owned(pharmacy_id, service_id) {
            return Ok(vec![]);
        }

        let mut rules: Vec<AvailabilityRule> = tables
            .rules
            .iter()
            .filter(|r| r.service_id == service_id && r.active())
            .filter(|r| day_of_week.map_or(true, |day| r.day_of_week == day))
            .cloned()
            .collect();
        rules.sort_by_key(|r| (r.start_time, r.created_at));
        Ok(rules)
    }

    async fn get_rule(&self, pharmacy_id: Uuid, rule_id: Uuid) -> StoreResult<AvailabilityRule> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        tables
            .rules
            .iter()
            .find(|r| r.id == rule_id && tables.service_owned(pharmacy_id, r.service_id))
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("Availability rule not found".to_string()))
    }

    async fn insert_rules(&self, pharmacy_id: Uuid, rules: Vec<NewAvailabilityRule>) -> StoreResult<Vec<AvailabilityRule>> {
        let mut tables = self.tables.write().await;
        if let Some(foreign) = rules.iter().find(|r| !tables.service_owned(pharmacy_id, r.service_id)) {
            return Err(DatabaseError::NotFound(format!("Service {} not found", foreign.service_id)));
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(rules.len());
        for rule in rules {
            let row = AvailabilityRule {
                id: Uuid::new_v4(),
                service_id: rule.service_id,
                day_of_week: rule.day_of_week,
                start_time: rule.start_time,
                end_time: rule.end_time,
                slot_length_minutes: rule.slot_length_minutes,
                max_bookings_per_slot: Some(rule.max_bookings_per_slot),
                staff_id: rule.staff_id,
                is_active: Some(rule.is_active),
                staff: tables.staff_name(rule.staff_id),
                created_at: Some(now),
            };
            tables.rules.push(row.clone());
            created.push(row);
        }

        debug!("Inserted {} rules in memory", created.len());
        Ok(created)
    }

    async fn set_rule_active(&self, pharmacy_id: Uuid, rule_id: Uuid, is_active: bool) -> StoreResult<AvailabilityRule> {
        let mut tables = self.tables.write().await;
        let owned: Vec<Uuid> = tables
            .services
            .values()
            .filter(|s| s.pharmacy_id == pharmacy_id)
            .map(|s| s.id)
            .collect();

        let rule = tables
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id && owned.contains(&r.service_id))
            .ok_or_else(|| DatabaseError::NotFound("Availability rule not found".to_string()))?;
        rule.is_active = Some(is_active);
        Ok(rule.clone())
    }

    async fn delete_rule(&self, pharmacy_id: Uuid, rule_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let position = tables
            .rules
            .iter()
            .position(|r| r.id == rule_id && tables.service_owned(pharmacy_id, r.service_id))
            .ok_or_else(|| DatabaseError::NotFound("Availability rule not found".to_string()))?;
        tables.rules.remove(position);
        Ok(())
    }

    async fn list_bookings(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        exclude_status: Option<BookingStatus>,
    ) -> StoreResult<Vec<Booking>> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.pharmacy_id == pharmacy_id && b.service_id == service_id)
            .filter(|b| b.booking_start >= range_start && b.booking_start < range_end)
            .filter(|b| exclude_status.map_or(true, |excluded| b.status != excluded))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.booking_start);
        Ok(bookings)
    }

    async fn list_pharmacy_bookings(&self, pharmacy_id: Uuid, status: Option<BookingStatus>) -> StoreResult<Vec<Booking>> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.pharmacy_id == pharmacy_id)
            .filter(|b| status.map_or(true, |wanted| b.status == wanted))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booking_start.cmp(&a.booking_start));
        Ok(bookings)
    }

    async fn insert_booking(&self, pharmacy_id: Uuid, booking: NewBooking) -> StoreResult<Booking> {
        if booking.pharmacy_id != pharmacy_id {
            return Err(DatabaseError::Rejected("Booking does not belong to this pharmacy".to_string()));
        }

        let mut tables = self.tables.write().await;
        if !tables.service_owned(pharmacy_id, booking.service_id) {
            return Err(DatabaseError::NotFound("Service not found".to_string()));
        }

        let duplicate = tables.bookings.iter().any(|b| {
            b.service_id == booking.service_id
                && b.staff_id == booking.staff_id
                && b.booking_start == booking.booking_start
                && b.status.holds_slot()
        });
        if duplicate {
            return Err(DatabaseError::Conflict(format!(
                "Slot {} is already booked",
                booking.booking_start
            )));
        }

        let now = Utc::now();
        let row = Booking {
            id: Uuid::new_v4(),
            pharmacy_id: booking.pharmacy_id,
            service_id: booking.service_id,
            staff_id: booking.staff_id,
            booking_start: booking.booking_start,
            booking_end: booking.booking_end,
            patient_first_name: booking.patient_first_name,
            patient_last_name: booking.patient_last_name,
            patient_email: booking.patient_email,
            patient_phone: booking.patient_phone,
            notes: booking.notes,
            status: booking.status,
            source: Some(booking.source),
            created_at: now,
            updated_at: now,
        };
        tables.bookings.push(row.clone());
        Ok(row)
    }

    async fn get_booking(&self, pharmacy_id: Uuid, booking_id: Uuid) -> StoreResult<Booking> {
        self.check_reads()?;
        self.tables
            .read()
            .await
            .bookings
            .iter()
            .find(|b| b.id == booking_id && b.pharmacy_id == pharmacy_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("Booking not found".to_string()))
    }

    async fn update_booking_status(&self, pharmacy_id: Uuid, booking_id: Uuid, status: BookingStatus) -> StoreResult<Booking> {
        let mut tables = self.tables.write().await;
        let booking = tables
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id && b.pharmacy_id == pharmacy_id)
            .ok_or_else(|| DatabaseError::NotFound("Booking not found".to_string()))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn get_booking_details(&self, booking_id: Uuid) -> StoreResult<BookingDetails> {
        self.check_reads()?;
        let tables = self.tables.read().await;
        let booking = tables
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("Booking not found".to_string()))?;

        let service = tables
            .services
            .get(&booking.service_id)
            .map(|s| BookedService {
                custom_title: s.custom_title.clone(),
                service_catalogue: s.catalogue.clone(),
            })
            .ok_or_else(|| DatabaseError::NotFound("Service not found".to_string()))?;

        let pharmacy = tables
            .pharmacies
            .get(&booking.pharmacy_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("Pharmacy not found".to_string()))?;

        let staff = tables.staff_name(booking.staff_id);

        Ok(BookingDetails { booking, service, pharmacy, staff })
    }

    async fn get_email_settings(&self, pharmacy_id: Uuid) -> StoreResult<Option<EmailSettings>> {
        self.check_reads()?;
        Ok(self.tables.read().await.email_settings.get(&pharmacy_id).cloned())
    }
}
