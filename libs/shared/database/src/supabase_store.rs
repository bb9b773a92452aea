use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::pharmacy::{BookingDetails, EmailSettings};
use shared_models::scheduling::{
    AvailabilityRule, Booking, BookingStatus, DayOfWeek, NewAvailabilityRule, NewBooking,
    Pharmacist, PharmacyService,
};

use crate::error::DatabaseError;
use crate::store::{SchedulingStore, StoreResult};
use crate::supabase::{return_representation, SupabaseClient};

const RULE_SELECT: &str = "*,pharmacists(first_name,last_name),pharmacy_services!inner(pharmacy_id)";
const BOOKING_DETAILS_SELECT: &str = "*,pharmacy_services(custom_title,service_catalogue(name)),\
pharmacies(name,primary_email,address_line1,city,postcode,phone),pharmacists(first_name,last_name)";

/// `SchedulingStore` over the Supabase PostgREST API.
///
/// Rule rows carry no pharmacy column, so tenant scoping for them goes through an
/// inner join on `pharmacy_services`.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::with_service_role(config),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Vec<T>> {
        self.supabase.request(Method::GET, path, None, None).await
    }

    async fn fetch_one<T: DeserializeOwned>(&self, path: &str, what: &str) -> StoreResult<T> {
        self.fetch::<T>(path)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound(what.to_string()))
    }

    async fn ensure_rule_owned(&self, pharmacy_id: Uuid, rule_id: Uuid) -> StoreResult<()> {
        let path = format!(
            "/rest/v1/service_availability?id=eq.{}&select=id,pharmacy_services!inner(pharmacy_id)&pharmacy_services.pharmacy_id=eq.{}",
            rule_id, pharmacy_id
        );
        let _: Value = self.fetch_one(&path, "Availability rule not found").await?;
        Ok(())
    }
}

fn encode_timestamp(ts: DateTime<Utc>) -> String {
    urlencoding::encode(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)).into_owned()
}

#[async_trait]
impl SchedulingStore for SupabaseStore {
    async fn get_service(&self, service_id: Uuid) -> StoreResult<PharmacyService> {
        let path = format!(
            "/rest/v1/pharmacy_services?id=eq.{}&select=*,service_catalogue(name)",
            service_id
        );
        self.fetch_one(&path, "Service not found").await
    }

    async fn get_service_for_tenant(&self, pharmacy_id: Uuid, service_id: Uuid) -> StoreResult<PharmacyService> {
        let path = format!(
            "/rest/v1/pharmacy_services?id=eq.{}&pharmacy_id=eq.{}&select=*,service_catalogue(name)",
            service_id, pharmacy_id
        );
        self.fetch_one(&path, "Service not found").await
    }

    async fn find_pharmacist_by_user(&self, user_id: Uuid) -> StoreResult<Option<Pharmacist>> {
        let path = format!(
            "/rest/v1/pharmacists?user_id=eq.{}&is_active=eq.true&limit=1",
            user_id
        );
        Ok(self.fetch::<Pharmacist>(&path).await?.into_iter().next())
    }

    async fn get_pharmacist(&self, pharmacy_id: Uuid, pharmacist_id: Uuid) -> StoreResult<Pharmacist> {
        let path = format!(
            "/rest/v1/pharmacists?id=eq.{}&pharmacy_id=eq.{}",
            pharmacist_id, pharmacy_id
        );
        self.fetch_one(&path, "Pharmacist not found").await
    }

    async fn list_rules(&self, pharmacy_id: Uuid, service_id: Uuid) -> StoreResult<Vec<AvailabilityRule>> {
        let path = format!(
            "/rest/v1/service_availability?select={}&pharmacy_service_id=eq.{}&pharmacy_services.pharmacy_id=eq.{}&order=day_of_week.asc,start_time.asc",
            RULE_SELECT, service_id, pharmacy_id
        );
        self.fetch(&path).await
    }

    async fn list_active_rules(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        day_of_week: Option<DayOfWeek>,
    ) -> StoreResult<Vec<AvailabilityRule>> {
        let mut path = format!(
            "/rest/v1/service_availability?select={}&pharmacy_service_id=eq.{}&pharmacy_services.pharmacy_id=eq.{}&is_active=eq.true",
            RULE_SELECT, service_id, pharmacy_id
        );
        if let Some(day) = day_of_week {
            path.push_str(&format!("&day_of_week=eq.{}", day.value()));
        }
        path.push_str("&order=start_time.asc,created_at.asc");

        let rules: Vec<AvailabilityRule> = self.fetch(&path).await?;
        debug!("Fetched {} active rules for service {}", rules.len(), service_id);
        Ok(rules)
    }

    async fn get_rule(&self, pharmacy_id: Uuid, rule_id: Uuid) -> StoreResult<AvailabilityRule> {
        let path = format!(
            "/rest/v1/service_availability?id=eq.{}&select={}&pharmacy_services.pharmacy_id=eq.{}",
            rule_id, RULE_SELECT, pharmacy_id
        );
        self.fetch_one(&path, "Availability rule not found").await
    }

    async fn insert_rules(&self, pharmacy_id: Uuid, rules: Vec<NewAvailabilityRule>) -> StoreResult<Vec<AvailabilityRule>> {
        if rules.is_empty() {
            return Ok(vec![]);
        }

        for service_id in rules.iter().map(|r| r.service_id).collect::<std::collections::BTreeSet<_>>() {
            self.get_service_for_tenant(pharmacy_id, service_id).await?;
        }

        let count = rules.len();
        let created: Vec<AvailabilityRule> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/service_availability?select=*,pharmacists(first_name,last_name)",
            None,
            Some(serde_json::to_value(&rules)?),
            Some(return_representation()),
        ).await?;

        info!("Inserted {} availability rules for pharmacy {}", count, pharmacy_id);
        Ok(created)
    }

    async fn set_rule_active(&self, pharmacy_id: Uuid, rule_id: Uuid, is_active: bool) -> StoreResult<AvailabilityRule> {
        self.ensure_rule_owned(pharmacy_id, rule_id).await?;

        let path = format!(
            "/rest/v1/service_availability?id=eq.{}&select=*,pharmacists(first_name,last_name)",
            rule_id
        );
        let updated: Vec<AvailabilityRule> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(json!({
                "is_active": is_active,
                "updated_at": Utc::now().to_rfc3339(),
            })),
            Some(return_representation()),
        ).await?;

        updated
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound("Availability rule not found".to_string()))
    }

    async fn delete_rule(&self, pharmacy_id: Uuid, rule_id: Uuid) -> StoreResult<()> {
        self.ensure_rule_owned(pharmacy_id, rule_id).await?;

        let path = format!("/rest/v1/service_availability?id=eq.{}", rule_id);
        self.supabase.execute(Method::DELETE, &path, None, None).await
    }

    async fn list_bookings(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        exclude_status: Option<BookingStatus>,
    ) -> StoreResult<Vec<Booking>> {
        let mut path = format!(
            "/rest/v1/bookings?pharmacy_id=eq.{}&pharmacy_service_id=eq.{}&booking_start=gte.{}&booking_start=lt.{}",
            pharmacy_id,
            service_id,
            encode_timestamp(range_start),
            encode_timestamp(range_end),
        );
        // A null status is an unreviewed (pending) booking, so it must survive the exclusion.
        if let Some(status) = exclude_status {
            path.push_str(&format!("&or=(status.is.null,status.neq.{})", status));
        }
        path.push_str("&order=booking_start.asc");

        self.fetch(&path).await
    }

    async fn list_pharmacy_bookings(&self, pharmacy_id: Uuid, status: Option<BookingStatus>) -> StoreResult<Vec<Booking>> {
        let mut path = format!("/rest/v1/bookings?pharmacy_id=eq.{}", pharmacy_id);
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        path.push_str("&order=booking_start.desc");

        self.fetch(&path).await
    }

    async fn insert_booking(&self, pharmacy_id: Uuid, booking: NewBooking) -> StoreResult<Booking> {
        if booking.pharmacy_id != pharmacy_id {
            warn!("Rejected booking insert for pharmacy {} under tenant {}", booking.pharmacy_id, pharmacy_id);
            return Err(DatabaseError::Rejected("Booking does not belong to this pharmacy".to_string()));
        }

        let created: Vec<Booking> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/bookings",
            None,
            Some(serde_json::to_value(&booking)?),
            Some(return_representation()),
        ).await?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::Decode("Insert returned no booking".to_string()))
    }

    async fn get_booking(&self, pharmacy_id: Uuid, booking_id: Uuid) -> StoreResult<Booking> {
        let path = format!(
            "/rest/v1/bookings?id=eq.{}&pharmacy_id=eq.{}",
            booking_id, pharmacy_id
        );
        self.fetch_one(&path, "Booking not found").await
    }

    async fn update_booking_status(&self, pharmacy_id: Uuid, booking_id: Uuid, status: BookingStatus) -> StoreResult<Booking> {
        let path = format!(
            "/rest/v1/bookings?id=eq.{}&pharmacy_id=eq.{}",
            booking_id, pharmacy_id
        );
        let updated: Vec<Booking> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(json!({
                "status": status,
                "updated_at": Utc::now().to_rfc3339(),
            })),
            Some(return_representation()),
        ).await?;

        updated
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound("Booking not found".to_string()))
    }

    async fn get_booking_details(&self, booking_id: Uuid) -> StoreResult<BookingDetails> {
        let path = format!(
            "/rest/v1/bookings?id=eq.{}&select={}",
            booking_id, BOOKING_DETAILS_SELECT
        );
        self.fetch_one(&path, "Booking not found").await
    }

    async fn get_email_settings(&self, pharmacy_id: Uuid) -> StoreResult<Option<EmailSettings>> {
        let path = format!("/rest/v1/email_settings?pharmacy_id=eq.{}&limit=1", pharmacy_id);
        Ok(self.fetch::<EmailSettings>(&path).await?.into_iter().next())
    }
}
