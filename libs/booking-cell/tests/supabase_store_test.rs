use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::models::{BookingError, CommitBookingRequest, PatientDetails};
use booking_cell::services::{BookingCommitter, SlotAvailabilityResolver};
use shared_database::{SchedulingStore, SupabaseStore};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};
use shared_utils::NoopNotifier;

struct Backend {
    server: MockServer,
    store: Arc<dyn SchedulingStore>,
    service_id: Uuid,
}

// Monday 2024-06-10, one rule 09:00-10:00 in 30 minute slots, 09:00 already booked.
async fn backend() -> Backend {
    let server = MockServer::start().await;
    let pharmacy_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/pharmacy_services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::service_response(service_id, pharmacy_id, "Travel clinic")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/service_availability"))
        .and(query_param("day_of_week", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::rule_response(service_id, 1, "09:00:00", "10:00:00", 30)
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_response(
                pharmacy_id,
                service_id,
                "2024-06-10T09:00:00+00:00",
                "2024-06-10T09:30:00+00:00",
            )
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::default().with_supabase_url(server.uri()).to_app_config();
    let store: Arc<dyn SchedulingStore> = Arc::new(SupabaseStore::new(&config));

    Backend { server, store, service_id }
}

#[tokio::test]
async fn resolver_reads_rules_and_bookings_from_postgrest() {
    let backend = backend().await;
    let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

    let day = SlotAvailabilityResolver::new(backend.store.clone())
        .resolve_public_at(backend.service_id, date, Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap())
        .await
        .unwrap();

    assert_eq!(day.slots.iter().map(|s| s.available).collect::<Vec<_>>(), vec![false, true]);
    assert_eq!(day.available_count(), 1);
}

#[tokio::test]
async fn unique_violation_from_insert_is_slot_unavailable() {
    let backend = backend().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::error_response("duplicate key value violates unique constraint", "23505"),
        ))
        .expect(1)
        .mount(&backend.server)
        .await;

    let start = Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap();
    let request = CommitBookingRequest {
        slot_start: start,
        slot_end: start + chrono::Duration::minutes(30),
        patient: PatientDetails {
            first_name: "Sam".to_string(),
            last_name: "Patel".to_string(),
            email: "sam@example.com".to_string(),
            phone: None,
            notes: None,
        },
    };

    let result = BookingCommitter::new(backend.store.clone(), Arc::new(NoopNotifier))
        .commit_at(backend.service_id, request, Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap())
        .await;

    assert_matches!(result, Err(BookingError::SlotUnavailable));
}
