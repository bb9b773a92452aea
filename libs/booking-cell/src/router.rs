use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_utils::{auth_middleware, AppState};

use crate::handlers;

pub fn booking_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/services/{service_id}/slots", get(handlers::get_slots))
        .route("/services/{service_id}/bookings", post(handlers::create_booking));

    let portal_routes = Router::new()
        .route("/portal/bookings", get(handlers::list_bookings))
        .route("/portal/bookings/{booking_id}/status", patch(handlers::update_booking_status))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(portal_routes)
        .with_state(state)
}
