use axum::{routing::post, Router};

use shared_utils::AppState;

use crate::handlers;

pub fn notification_routes(state: AppState) -> Router {
    Router::new()
        .route("/notifications/booking-created", post(handlers::booking_created))
        .with_state(state)
}
