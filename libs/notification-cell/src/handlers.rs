use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::BookingCreatedRequest;
use crate::services::{NotificationDispatcher, ResendMailer};

pub async fn booking_created(
    State(state): State<AppState>,
    Json(request): Json<BookingCreatedRequest>,
) -> Result<Json<Value>, AppError> {
    let mailer = Arc::new(ResendMailer::new(&state.config)?);
    let dispatcher = NotificationDispatcher::new(
        state.store.clone(),
        mailer,
        state.config.mail_from.clone(),
        state.config.notification_window_minutes,
    );

    let report = dispatcher.dispatch(&request.booking_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Booking confirmation emails sent",
        "patient_email_sent": report.patient_email_sent,
        "pharmacy_email_sent": report.pharmacy_email_sent,
    })))
}
