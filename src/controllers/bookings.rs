use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{AppJson, AppPath, AuthUser},
    services::booking::{self, BookingRequest, QuoteRequest},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/quote", post(quote))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", put(cancel_booking))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(req): AppJson<BookingRequest>,
) -> AppResult<impl IntoResponse> {
    let booking = booking::create(&state.db.pool, user.id(), req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Booking created successfully",
            "booking": booking,
        })),
    ))
}

// GET /api/bookings
async fn list_bookings(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<impl IntoResponse> {
    let bookings = booking::list_for_user(&state.db.pool, user.id()).await?;
    Ok(Json(json!({ "success": true, "count": bookings.len(), "bookings": bookings })))
}

// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    let booking = booking::get(&state.db.pool, id, user.id()).await?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

// PUT /api/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    let booking = booking::cancel(&state.db.pool, id, user.id()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Booking cancelled successfully",
        "booking": booking,
    })))
}

// POST /api/bookings/quote
async fn quote(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    AppJson(req): AppJson<QuoteRequest>,
) -> AppResult<impl IntoResponse> {
    let quote = booking::quote(&state.db.pool, &req).await?;
    Ok(Json(json!({ "success": true, "quote": quote })))
}
