use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::scheduling::Pharmacist;

use crate::jwt::validate_token;
use crate::state::AppState;

/// Validates the bearer token and stores the resulting `User` in request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = auth
        .ok_or_else(|| AppError::Auth("Missing or malformed authorization header".to_string()))?;

    let user = validate_token(bearer.token(), &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn extract_user(parts: &Parts) -> Result<User, AppError> {
    parts
        .extensions
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

/// The authenticated staff member together with the pharmacy they act for.
///
/// Every portal handler takes this instead of trusting a tenant id from the request.
#[derive(Debug, Clone)]
pub struct PortalTenant {
    pub user: User,
    pub pharmacist: Pharmacist,
}

impl PortalTenant {
    pub fn pharmacy_id(&self) -> Uuid {
        self.pharmacist.pharmacy_id
    }
}

impl FromRequestParts<AppState> for PortalTenant {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = extract_user(parts)?;
        let user_id = user
            .user_id()
            .ok_or_else(|| AppError::Auth("Token subject is not a user id".to_string()))?;

        let pharmacist = state
            .store
            .find_pharmacist_by_user(user_id)
            .await?
            .ok_or_else(|| {
                warn!("User {} has no pharmacist record", user_id);
                AppError::Forbidden("No pharmacy is linked to this account".to_string())
            })?;

        debug!("Resolved user {} to pharmacy {}", user_id, pharmacist.pharmacy_id);
        Ok(PortalTenant { user, pharmacist })
    }
}
