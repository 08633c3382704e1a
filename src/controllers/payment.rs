use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{AppJson, AuthUser},
    services::{booking::BookingRequest, payment},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/payments/checkout", post(checkout))
}

// POST /api/payments/checkout
async fn checkout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(req): AppJson<BookingRequest>,
) -> AppResult<impl IntoResponse> {
    let result = payment::checkout(&state.db.pool, user.id(), state.config.payment.processing_delay, req).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Payment processed successfully",
        "booking": result.booking,
        "payment": result.payment,
    })))
}
