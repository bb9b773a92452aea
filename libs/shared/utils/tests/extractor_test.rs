use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use tower::ServiceExt;

use shared_database::InMemoryStore;
use shared_utils::test_utils::{test_state, JwtTestUtils, TestConfig, TestUser};
use shared_utils::{auth_middleware, AppState, PortalTenant};

async fn whoami(tenant: PortalTenant) -> String {
    tenant.pharmacy_id().to_string()
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}

fn request(auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().uri("/whoami");
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn pharmacist_resolves_to_their_pharmacy() {
    let store = Arc::new(InMemoryStore::new());
    let user = TestUser::pharmacist("staff@example.com");
    let pharmacy_id = store.seed_pharmacy("Rank", None).await;
    store.seed_pharmacist(pharmacy_id, Some(user.uuid()), "Ada", "Okafor").await;

    let response = app(test_state(store))
        .oneshot(request(Some(JwtTestUtils::bearer(&user, &TestConfig::default()))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), pharmacy_id.to_string());
}

#[tokio::test]
async fn user_without_pharmacist_row_is_forbidden() {
    let store = Arc::new(InMemoryStore::new());
    let user = TestUser::pharmacist("stranger@example.com");

    let response = app(test_state(store))
        .oneshot(request(Some(JwtTestUtils::bearer(&user, &TestConfig::default()))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_or_expired_token_is_unauthorized() {
    let store = Arc::new(InMemoryStore::new());
    let config = TestConfig::default();
    let expired = JwtTestUtils::create_expired_token(&TestUser::default(), &config.jwt_secret);

    let missing = app(test_state(store.clone())).oneshot(request(None)).await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let stale = app(test_state(store))
        .oneshot(request(Some(format!("Bearer {}", expired))))
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);
}
