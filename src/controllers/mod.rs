pub mod admin;
pub mod auth;
pub mod bookings;
pub mod movies;
pub mod payment;
pub mod rooms;

use axum::{routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(movies::routes())
        .merge(rooms::routes())
        .merge(bookings::routes())
        .merge(payment::routes())
        .merge(admin::routes())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}
