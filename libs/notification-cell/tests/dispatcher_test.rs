use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::models::NotificationError;
use notification_cell::services::{NotificationDispatcher, ResendMailer};
use shared_database::InMemoryStore;
use shared_models::pharmacy::EmailSettings;
use shared_models::scheduling::{Booking, BookingStatus};
use shared_utils::test_utils::TestConfig;
use shared_utils::BookingNotifier;

struct Fixture {
    store: Arc<InMemoryStore>,
    pharmacy_id: Uuid,
    booking_id: Uuid,
    now: DateTime<Utc>,
}

async fn setup(created_minutes_ago: i64, staff: bool) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let pharmacy_id = store.seed_pharmacy("Rank Pharmacy", Some("shop@example.com")).await;
    let service = store.seed_service(pharmacy_id, "Flu jab").await;
    let staff_id = if staff {
        Some(store.seed_pharmacist(pharmacy_id, None, "Ada", "Okafor").await.id)
    } else {
        None
    };

    let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap();
    let booking_id = Uuid::new_v4();
    store
        .seed_booking(Booking {
            id: booking_id,
            pharmacy_id,
            service_id: service.id,
            staff_id,
            booking_start: start,
            booking_end: start + Duration::minutes(30),
            patient_first_name: "Jo".to_string(),
            patient_last_name: "Bloggs".to_string(),
            patient_email: "jo@example.com".to_string(),
            patient_phone: None,
            notes: None,
            status: BookingStatus::Pending,
            source: Some("web".to_string()),
            created_at: now - Duration::minutes(created_minutes_ago),
            updated_at: now - Duration::minutes(created_minutes_ago),
        })
        .await;

    Fixture { store, pharmacy_id, booking_id, now }
}

fn dispatcher(fx: &Fixture, server: &MockServer) -> NotificationDispatcher {
    let config = TestConfig::default().with_resend_url(server.uri()).to_app_config();
    let mailer = ResendMailer::new(&config).unwrap();
    NotificationDispatcher::new(fx.store.clone(), Arc::new(mailer), config.mail_from, config.notification_window_minutes)
}

fn sent() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "id": "email_123" }))
}

#[tokio::test]
async fn sends_both_emails_with_default_settings() {
    let server = MockServer::start().await;
    let fx = setup(1, true).await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("Authorization", "Bearer test-resend-key"))
        .and(body_partial_json(json!({
            "to": ["jo@example.com"],
            "subject": "Appointment Confirmed - Flu jab"
        })))
        .respond_with(sent())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({
            "to": ["shop@example.com"],
            "subject": "New Booking: Flu jab - Monday 10 June 2024 at 09:30"
        })))
        .respond_with(sent())
        .expect(1)
        .mount(&server)
        .await;

    let report = dispatcher(&fx, &server)
        .dispatch_at(&fx.booking_id.to_string(), fx.now)
        .await
        .unwrap();

    assert!(report.patient_email_sent);
    assert!(report.pharmacy_email_sent);
}

#[tokio::test]
async fn settings_pick_recipients_and_switches() {
    let server = MockServer::start().await;
    let fx = setup(2, false).await;
    fx.store
        .seed_email_settings(EmailSettings {
            pharmacy_id: fx.pharmacy_id,
            booking_notification_email: Some("bookings@example.com".to_string()),
            cc_email: Some("manager@example.com".to_string()),
            send_patient_confirmation: Some(false),
            send_pharmacy_notification: Some(true),
        })
        .await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({ "to": ["bookings@example.com", "manager@example.com"] })))
        .respond_with(sent())
        .expect(1)
        .mount(&server)
        .await;

    let report = dispatcher(&fx, &server)
        .dispatch_at(&fx.booking_id.to_string(), fx.now)
        .await
        .unwrap();

    assert!(!report.patient_email_sent);
    assert!(report.pharmacy_email_sent);
}

#[tokio::test]
async fn patient_email_failure_does_not_block_pharmacy_email() {
    let server = MockServer::start().await;
    let fx = setup(0, false).await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({ "to": ["jo@example.com"] })))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "message": "invalid recipient" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({ "to": ["shop@example.com"] })))
        .respond_with(sent())
        .expect(1)
        .mount(&server)
        .await;

    let report = dispatcher(&fx, &server)
        .dispatch_at(&fx.booking_id.to_string(), fx.now)
        .await
        .unwrap();

    assert!(!report.patient_email_sent);
    assert!(report.pharmacy_email_sent);
}

#[tokio::test]
async fn old_bookings_are_refused_before_any_email() {
    let server = MockServer::start().await;
    let fx = setup(6, false).await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(sent())
        .expect(0)
        .mount(&server)
        .await;

    let result = dispatcher(&fx, &server)
        .dispatch_at(&fx.booking_id.to_string(), fx.now)
        .await;

    assert_matches!(result, Err(NotificationError::ConfirmationWindowExpired));
}

#[tokio::test]
async fn malformed_and_unknown_ids() {
    let server = MockServer::start().await;
    let fx = setup(0, false).await;
    let dispatcher = dispatcher(&fx, &server);

    assert_matches!(
        dispatcher.dispatch_at("'; select 1; --", fx.now).await,
        Err(NotificationError::InvalidBookingId)
    );
    assert_matches!(
        dispatcher.dispatch_at(&Uuid::new_v4().to_string(), fx.now).await,
        Err(NotificationError::BookingNotFound)
    );
}

#[tokio::test]
async fn notifier_trait_reports_dispatch_failures() {
    let server = MockServer::start().await;
    let fx = setup(0, false).await;

    let result = dispatcher(&fx, &server).booking_created(Uuid::new_v4()).await;
    assert!(result.is_err());
}
