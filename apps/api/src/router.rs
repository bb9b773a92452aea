use axum::{
    Json, Router,
    routing::get,
};
use serde_json::json;

use availability_cell::router::availability_routes;
use booking_cell::router::booking_routes;
use notification_cell::router::notification_routes;
use shared_utils::AppState;

pub fn create_router(state: AppState) -> Router {
    // Cells share the /services and /portal prefixes, so they are merged rather than nested.
    Router::new()
        .route("/", get(|| async { "Pharmacy Booking API is running!" }))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .merge(availability_routes(state.clone()))
        .merge(booking_routes(state.clone()))
        .merge(notification_routes(state))
}
