use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::{AppState, PortalTenant};

use crate::models::{AvailableDatesQuery, RuleDraft, UpdateRuleRequest};
use crate::services::{AvailabilityCalendar, AvailabilityRuleService};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn get_available_dates(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
    Query(query): Query<AvailableDatesQuery>,
) -> Result<Json<Value>, AppError> {
    let horizon_days = query.horizon_days.unwrap_or(state.config.booking_horizon_days);
    let today = Utc::now().date_naive();

    let calendar = AvailabilityCalendar::new(state.store.clone());
    let available = calendar.available_dates(service_id, today, horizon_days).await?;

    Ok(Json(json!(available)))
}

// ==============================================================================
// PORTAL HANDLERS
// ==============================================================================

pub async fn list_rules(
    State(state): State<AppState>,
    tenant: PortalTenant,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityRuleService::new(state.store.clone());
    let rules = service.list_rules(tenant.pharmacy_id(), service_id).await?;

    Ok(Json(json!({
        "rules": rules,
        "total": rules.len(),
    })))
}

pub async fn create_rules(
    State(state): State<AppState>,
    tenant: PortalTenant,
    Path(service_id): Path<Uuid>,
    Json(draft): Json<RuleDraft>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AvailabilityRuleService::new(state.store.clone());
    let rules = service.create_rules(tenant.pharmacy_id(), service_id, draft).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "rules": rules,
        "message": format!("Created {} availability rule(s)", rules.len()),
    }))))
}

pub async fn validate_rule_draft(
    State(state): State<AppState>,
    tenant: PortalTenant,
    Path(service_id): Path<Uuid>,
    Json(draft): Json<RuleDraft>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityRuleService::new(state.store.clone());
    let validation = service.validate_draft(tenant.pharmacy_id(), service_id, &draft).await?;

    Ok(Json(json!(validation)))
}

pub async fn update_rule(
    State(state): State<AppState>,
    tenant: PortalTenant,
    Path(rule_id): Path<Uuid>,
    Json(request): Json<UpdateRuleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityRuleService::new(state.store.clone());
    let rule = service.set_active(tenant.pharmacy_id(), rule_id, request.is_active).await?;

    Ok(Json(json!(rule)))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    tenant: PortalTenant,
    Path(rule_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = AvailabilityRuleService::new(state.store.clone());
    service.delete_rule(tenant.pharmacy_id(), rule_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
