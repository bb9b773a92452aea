use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::{AppState, PortalTenant};

use crate::models::{BookingListQuery, CommitBookingRequest, SlotQuery, UpdateStatusRequest};
use crate::services::{BookingCommitter, BookingLifecycleService, SlotAvailabilityResolver};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn get_slots(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let resolver = SlotAvailabilityResolver::new(state.store.clone());
    let day = resolver.resolve_public(service_id, query.date).await?;

    Ok(Json(json!({
        "service_id": day.service_id,
        "date": day.date,
        "slots": day.slots,
        "available_count": day.available_count(),
        "has_rules": !day.has_no_rules(),
        "fully_booked": day.fully_booked(),
    })))
}

pub async fn create_booking(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
    Json(request): Json<CommitBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let committer = BookingCommitter::new(state.store.clone(), state.notifier.clone());
    let booking = committer.commit(service_id, request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "booking": booking,
        "message": "Booking received. You will get a confirmation email shortly.",
    }))))
}

// ==============================================================================
// PORTAL HANDLERS
// ==============================================================================

pub async fn list_bookings(
    State(state): State<AppState>,
    tenant: PortalTenant,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = BookingLifecycleService::new(state.store.clone());
    let bookings = service.list_bookings(tenant.pharmacy_id(), query.status).await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len(),
    })))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    tenant: PortalTenant,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingLifecycleService::new(state.store.clone());
    let booking = service.update_status(tenant.pharmacy_id(), booking_id, request.status).await?;

    Ok(Json(json!(booking)))
}
