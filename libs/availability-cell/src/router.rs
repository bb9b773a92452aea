use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_utils::{auth_middleware, AppState};

use crate::handlers;

pub fn availability_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/services/{service_id}/available-dates", get(handlers::get_available_dates));

    let portal_routes = Router::new()
        .route(
            "/portal/services/{service_id}/availability",
            get(handlers::list_rules).post(handlers::create_rules),
        )
        .route(
            "/portal/services/{service_id}/availability/validate",
            post(handlers::validate_rule_draft),
        )
        .route(
            "/portal/availability/{rule_id}",
            patch(handlers::update_rule).delete(handlers::delete_rule),
        )
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(portal_routes)
        .with_state(state)
}
