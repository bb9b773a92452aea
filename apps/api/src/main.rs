use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use notification_cell::services::{NotificationDispatcher, ResendMailer};
use shared_config::AppConfig;
use shared_database::{InMemoryStore, SchedulingStore, SupabaseStore};
use shared_utils::{AppState, BookingNotifier, HttpNotifier, NoopNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pharmacy Booking API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    let store: Arc<dyn SchedulingStore> = if config.supabase_url.is_empty() {
        warn!("SUPABASE_URL not set, bookings are kept in memory and lost on restart");
        Arc::new(InMemoryStore::new())
    } else {
        Arc::new(SupabaseStore::new(&config))
    };

    let notifier = booking_notifier(&config, store.clone());
    let state = AppState::new(config.clone(), store, notifier);

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Remote endpoint if one is configured, otherwise dispatch in-process.
fn booking_notifier(config: &AppConfig, store: Arc<dyn SchedulingStore>) -> Arc<dyn BookingNotifier> {
    if let Some(url) = &config.notification_url {
        info!("Booking notifications are POSTed to {}", url);
        return Arc::new(HttpNotifier::new(url.clone()));
    }

    match ResendMailer::new(config) {
        Ok(mailer) => Arc::new(NotificationDispatcher::new(
            store,
            Arc::new(mailer),
            config.mail_from.clone(),
            config.notification_window_minutes,
        )),
        Err(e) => {
            warn!("Booking notifications disabled: {}", e);
            Arc::new(NoopNotifier)
        }
    }
}
