use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tokio::sync::Mutex;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{InMemoryStore, SchedulingStore};
use shared_models::auth::User;

use crate::notify::{BookingNotifier, NoopNotifier, NotifyError};
use crate::state::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub resend_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            resend_base_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(mut self, url: impl Into<String>) -> Self {
        self.supabase_url = url.into();
        self
    }

    pub fn with_resend_url(mut self, url: impl Into<String>) -> Self {
        self.resend_base_url = url.into();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: "test-service-role-key".to_string(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            resend_api_key: "test-resend-key".to_string(),
            resend_base_url: self.resend_base_url.clone(),
            mail_from: "Test Pharmacy <bookings@example.com>".to_string(),
            notification_url: None,
            booking_horizon_days: shared_config::DEFAULT_BOOKING_HORIZON_DAYS,
            notification_window_minutes: shared_config::DEFAULT_NOTIFICATION_WINDOW_MINUTES,
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "authenticated".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn pharmacist(email: &str) -> Self {
        Self::new(email, "authenticated")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).unwrap_or_default()
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "aud": "authenticated",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, config: &TestConfig) -> String {
        format!("Bearer {}", Self::create_test_token(user, &config.jwt_secret, None))
    }
}

/// Records every booking-created trigger it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notified: Mutex<Vec<Uuid>>,
}

impl RecordingNotifier {
    pub async fn notified_ids(&self) -> Vec<Uuid> {
        self.notified.lock().await.clone()
    }
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn booking_created(&self, booking_id: Uuid) -> Result<(), NotifyError> {
        self.notified.lock().await.push(booking_id);
        Ok(())
    }
}

/// Always fails, to prove a broken dispatcher never affects a booking.
pub struct FailingNotifier;

#[async_trait]
impl BookingNotifier for FailingNotifier {
    async fn booking_created(&self, _booking_id: Uuid) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("mail relay unreachable".to_string()))
    }
}

pub fn test_state(store: Arc<InMemoryStore>) -> AppState {
    test_state_with_notifier(store, Arc::new(NoopNotifier))
}

pub fn test_state_with_notifier(store: Arc<InMemoryStore>, notifier: Arc<dyn BookingNotifier>) -> AppState {
    let store: Arc<dyn SchedulingStore> = store;
    AppState::new(TestConfig::default().to_arc(), store, notifier)
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn service_response(service_id: Uuid, pharmacy_id: Uuid, title: &str) -> serde_json::Value {
        json!({
            "id": service_id,
            "pharmacy_id": pharmacy_id,
            "custom_title": title,
            "is_active": true,
            "service_catalogue": { "name": "Vaccination" }
        })
    }

    pub fn rule_response(service_id: Uuid, day_of_week: u8, start: &str, end: &str, slot_length: u32) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "pharmacy_service_id": service_id,
            "day_of_week": day_of_week,
            "start_time": start,
            "end_time": end,
            "slot_length_minutes": slot_length,
            "max_bookings_per_slot": 1,
            "pharmacist_id": null,
            "is_active": true,
            "pharmacists": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn booking_response(pharmacy_id: Uuid, service_id: Uuid, start: &str, end: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "pharmacy_id": pharmacy_id,
            "pharmacy_service_id": service_id,
            "pharmacist_id": null,
            "booking_start": start,
            "booking_end": end,
            "patient_first_name": "Jo",
            "patient_last_name": "Bloggs",
            "patient_email": "jo@example.com",
            "patient_phone": null,
            "notes": null,
            "status": "pending",
            "source": "web",
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
