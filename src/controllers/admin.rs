use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc};
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    middleware::{AdminUser, AppJson, AppPath},
    models::{
        booking::{Booking, BookingStatus},
        movie::{MoviePatch, NewMovie},
        user::{Role, User},
    },
    services::{admin, auth, pricing},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}", get(get_user).delete(delete_user))
        .route("/admin/users/{id}/role", put(set_user_role))
        .route("/admin/movies", post(create_movie))
        .route("/admin/movies/{id}", put(update_movie).delete(delete_movie))
        .route("/admin/bookings", get(list_bookings))
        .route("/admin/bookings/{id}", axum::routing::delete(delete_booking))
        .route("/admin/bookings/{id}/status", put(set_booking_status))
        .route("/admin/pricing", get(get_pricing).put(update_pricing))
        .route("/admin/pricing/{key}", get(get_pricing_key).put(update_pricing_key))
}

/* ---------- DASHBOARD ---------- */

async fn stats(State(state): State<Arc<AppState>>, _admin: AdminUser) -> AppResult<impl IntoResponse> {
    let stats = admin::dashboard(&state.db.pool, &state.catalog).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/* ---------- USERS ---------- */

async fn list_users(State(state): State<Arc<AppState>>, _admin: AdminUser) -> AppResult<impl IntoResponse> {
    let users = User::list_all(&state.db.pool).await?;
    Ok(Json(json!({ "success": true, "count": users.len(), "users": users })))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    let user = auth::get_user(&state.db.pool, id).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

#[derive(Debug, Deserialize)]
struct RoleBody {
    role: Option<String>,
}

async fn set_user_role(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<RoleBody>,
) -> AppResult<impl IntoResponse> {
    let role = body
        .role
        .as_deref()
        .and_then(Role::parse)
        .ok_or_else(|| AppError::validation("Invalid role. Must be \"user\" or \"admin\""))?;
    let user = User::set_role(&state.db.pool, id, role)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!("Admin {} set role of user {} to {:?}", admin.id, id, role);
    Ok(Json(json!({
        "success": true,
        "message": "User role updated successfully",
        "user": user,
    })))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    if !User::delete(&state.db.pool, id).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!("Admin {} deleted user {}", admin.id, id);
    Ok(Json(json!({ "success": true, "message": "User deleted successfully" })))
}

/* ---------- MOVIES ---------- */

async fn create_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    AppJson(new): AppJson<NewMovie>,
) -> AppResult<impl IntoResponse> {
    let movie = state.catalog.create(new).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Movie created successfully", "movie": movie })),
    ))
}

async fn update_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    AppPath(id): AppPath<String>,
    AppJson(patch): AppJson<MoviePatch>,
) -> AppResult<impl IntoResponse> {
    let movie = state.catalog.update(&id, patch).await?;
    Ok(Json(json!({ "success": true, "message": "Movie updated successfully", "movie": movie })))
}

async fn delete_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    AppPath(id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    state.catalog.delete(&id).await?;
    Ok(Json(json!({ "success": true, "message": "Movie deleted successfully" })))
}

/* ---------- BOOKINGS ---------- */

async fn list_bookings(State(state): State<Arc<AppState>>, _admin: AdminUser) -> AppResult<impl IntoResponse> {
    let bookings = Booking::list_all(&state.db.pool).await?;
    Ok(Json(json!({ "success": true, "count": bookings.len(), "bookings": bookings })))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: Option<String>,
}

async fn set_booking_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<StatusBody>,
) -> AppResult<impl IntoResponse> {
    let status = body
        .status
        .as_deref()
        .and_then(BookingStatus::parse)
        .ok_or_else(|| AppError::validation("Invalid status. Must be pending, confirmed, or cancelled"))?;
    let booking = Booking::set_status(&state.db.pool, id, status)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))?;
    Ok(Json(json!({
        "success": true,
        "message": "Booking status updated successfully",
        "booking": booking,
    })))
}

async fn delete_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    if !Booking::delete(&state.db.pool, id).await? {
        return Err(AppError::not_found("Booking not found"));
    }
    Ok(Json(json!({ "success": true, "message": "Booking deleted successfully" })))
}

/* ---------- PRICING ---------- */

async fn get_pricing(State(state): State<Arc<AppState>>, _admin: AdminUser) -> AppResult<impl IntoResponse> {
    let entries = pricing::all_entries(&state.db.pool).await?;
    Ok(Json(json!({ "success": true, "pricing": entries })))
}

#[derive(Debug, Deserialize)]
struct BulkPricingBody {
    pricing: Option<BTreeMap<String, serde_json::Value>>,
}

async fn update_pricing(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    AppJson(body): AppJson<BulkPricingBody>,
) -> AppResult<impl IntoResponse> {
    let values = body
        .pricing
        .ok_or_else(|| AppError::validation("Invalid pricing data"))?;
    let outcome = pricing::update_many(&state.db.pool, values).await?;
    let message = if outcome.errors.is_empty() {
        "Pricing updated successfully"
    } else {
        "Pricing updated with some errors"
    };
    Ok(Json(json!({
        "success": outcome.errors.is_empty(),
        "message": message,
        "results": outcome.results,
        "errors": outcome.errors,
    })))
}

async fn get_pricing_key(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    AppPath(key): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let value = pricing::get(&state.db.pool, &key).await?;
    Ok(Json(json!({ "success": true, "key": key, "value": value })))
}

#[derive(Debug, Deserialize)]
struct ValueBody {
    value: Option<serde_json::Value>,
}

async fn update_pricing_key(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    AppPath(key): AppPath<String>,
    AppJson(body): AppJson<ValueBody>,
) -> AppResult<impl IntoResponse> {
    let value = body
        .value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| AppError::validation("Invalid pricing value. Must be a positive number."))?;
    let value = pricing::update(&state.db.pool, &key, value).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Pricing updated successfully",
        "key": key,
        "value": value,
    })))
}
