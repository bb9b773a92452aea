use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use booking_cell::router::booking_routes;
use shared_database::{InMemoryStore, SchedulingStore};
use shared_models::scheduling::{DayOfWeek, NewAvailabilityRule};
use shared_utils::test_utils::{test_state, JwtTestUtils, TestConfig, TestUser};

struct Fixture {
    app: Router,
    store: Arc<InMemoryStore>,
    service_id: Uuid,
    auth: String,
    date: NaiveDate,
}

async fn setup() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let pharmacy_id = store.seed_pharmacy("Rank Pharmacy", Some("shop@example.com")).await;
    let service = store.seed_service(pharmacy_id, "Travel clinic").await;
    let user = TestUser::pharmacist("staff@example.com");
    store.seed_pharmacist(pharmacy_id, Some(user.uuid()), "Ada", "Okafor").await;

    store
        .insert_rules(pharmacy_id, vec![NewAvailabilityRule {
            service_id: service.id,
            day_of_week: DayOfWeek::WEDNESDAY,
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            slot_length_minutes: 20,
            max_bookings_per_slot: 1,
            staff_id: None,
            is_active: true,
        }])
        .await
        .unwrap();

    let mut date = Utc::now().date_naive() + Duration::days(1);
    while date.weekday() != Weekday::Wed {
        date += Duration::days(1);
    }

    Fixture {
        app: booking_routes(test_state(store.clone())),
        store,
        service_id: service.id,
        auth: JwtTestUtils::bearer(&user, &TestConfig::default()),
        date,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn booking_body(start: &str, end: &str) -> Value {
    json!({
        "slot_start": start,
        "slot_end": end,
        "first_name": "Jo",
        "last_name": "Bloggs",
        "email": "jo@example.com",
        "phone": "07700 900123"
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn slots_then_book_then_slot_is_taken() {
    let fx = setup().await;
    let slots_uri = format!("/services/{}/slots?date={}", fx.service_id, fx.date);

    let response = fx.app.clone()
        .oneshot(Request::builder().uri(&slots_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let day = body_json(response).await;
    assert_eq!(day["slots"].as_array().unwrap().len(), 3);
    assert_eq!(day["available_count"], 3);

    let first = day["slots"][0].clone();
    let start = first["start"].as_str().unwrap();
    let end = first["end"].as_str().unwrap();

    let booked = fx.app.clone()
        .oneshot(post_json(&format!("/services/{}/bookings", fx.service_id), booking_body(start, end)))
        .await
        .unwrap();
    assert_eq!(booked.status(), StatusCode::CREATED);
    assert_eq!(body_json(booked).await["booking"]["status"], "pending");

    let again = fx.app.clone()
        .oneshot(post_json(&format!("/services/{}/bookings", fx.service_id), booking_body(start, end)))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let response = fx.app
        .oneshot(Request::builder().uri(&slots_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let day = body_json(response).await;
    assert_eq!(day["slots"][0]["available"], false);
    assert_eq!(day["available_count"], 2);
}

#[tokio::test]
async fn bad_patient_fields_are_reported() {
    let fx = setup().await;
    let start = fx.date.and_hms_opt(14, 0, 0).unwrap().and_utc();

    let mut body = booking_body(&start.to_rfc3339(), &(start + Duration::minutes(20)).to_rfc3339());
    body["email"] = json!("jo-at-example");

    let response = fx.app
        .oneshot(post_json(&format!("/services/{}/bookings", fx.service_id), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["fields"][0]["field"], "email");
}

#[tokio::test]
async fn unknown_service_is_not_found() {
    let fx = setup().await;
    let response = fx.app
        .oneshot(Request::builder()
            .uri(format!("/services/{}/slots?date={}", Uuid::new_v4(), fx.date))
            .body(Body::empty())
            .unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_confirms_and_filters_bookings() {
    let fx = setup().await;
    let start = fx.date.and_hms_opt(14, 20, 0).unwrap().and_utc();
    let booked = fx.app.clone()
        .oneshot(post_json(
            &format!("/services/{}/bookings", fx.service_id),
            booking_body(&start.to_rfc3339(), &(start + Duration::minutes(20)).to_rfc3339()),
        ))
        .await
        .unwrap();
    let booking_id = body_json(booked).await["booking"]["id"].as_str().unwrap().to_string();

    let confirm = fx.app.clone()
        .oneshot(Request::builder()
            .method("PATCH")
            .uri(format!("/portal/bookings/{}/status", booking_id))
            .header("Authorization", &fx.auth)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({ "status": "confirmed" }).to_string()))
            .unwrap())
        .await
        .unwrap();
    assert_eq!(confirm.status(), StatusCode::OK);

    let reopen = fx.app.clone()
        .oneshot(Request::builder()
            .method("PATCH")
            .uri(format!("/portal/bookings/{}/status", booking_id))
            .header("Authorization", &fx.auth)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({ "status": "pending" }).to_string()))
            .unwrap())
        .await
        .unwrap();
    assert_eq!(reopen.status(), StatusCode::BAD_REQUEST);

    let listed = fx.app
        .oneshot(Request::builder()
            .uri("/portal/bookings?status=confirmed")
            .header("Authorization", &fx.auth)
            .body(Body::empty())
            .unwrap())
        .await
        .unwrap();
    let listed = body_json(listed).await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["bookings"][0]["id"], booking_id.as_str());
    assert_eq!(fx.store.booking_count().await, 1);
}

#[tokio::test]
async fn booking_list_requires_a_pharmacist() {
    let fx = setup().await;
    let stranger = TestUser::pharmacist("stranger@example.com");

    let response = fx.app
        .oneshot(Request::builder()
            .uri("/portal/bookings")
            .header("Authorization", JwtTestUtils::bearer(&stranger, &TestConfig::default()))
            .body(Body::empty())
            .unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(fx.store.list_pharmacy_bookings(Uuid::new_v4(), None).await.unwrap().is_empty());
}
