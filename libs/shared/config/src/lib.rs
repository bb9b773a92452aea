use std::env;
use tracing::warn;

pub const DEFAULT_BOOKING_HORIZON_DAYS: u32 = 60;
pub const DEFAULT_NOTIFICATION_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub resend_api_key: String,
    pub resend_base_url: String,
    pub mail_from: String,
    /// Where the booking-created trigger is POSTed. `None` disables it.
    pub notification_url: Option<String>,
    pub booking_horizon_days: u32,
    pub notification_window_minutes: i64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            resend_api_key: env::var("RESEND_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("RESEND_API_KEY not set, booking emails will not be sent");
                    String::new()
                }),
            resend_base_url: env::var("RESEND_BASE_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Rank Pharmacy <bookings@appy.farm>".to_string()),
            notification_url: env::var("NOTIFICATION_URL").ok().filter(|url| !url.is_empty()),
            booking_horizon_days: parse_or_default("BOOKING_HORIZON_DAYS", DEFAULT_BOOKING_HORIZON_DAYS),
            notification_window_minutes: parse_or_default(
                "NOTIFICATION_WINDOW_MINUTES",
                DEFAULT_NOTIFICATION_WINDOW_MINUTES,
            ),
            port: parse_or_default("PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.resend_api_key.is_empty() && !self.resend_base_url.is_empty()
    }

    /// Key used for privileged reads (notification re-fetch). Falls back to the anon key.
    pub fn service_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn parse_or_default<T: std::str::FromStr + std::fmt::Display + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
