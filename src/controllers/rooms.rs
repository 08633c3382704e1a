use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{AppPath, AppQuery},
    models::room::{find_room, RoomListing, VIEWING_ROOMS},
    services::{pricing, schedule},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/{id}", get(get_room))
        .route("/showtimes/{showtime_id}/seats", get(seat_map))
        .route("/pricing", get(public_pricing))
}

// GET /api/rooms
async fn list_rooms(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let sheet = pricing::price_sheet(&state.db.pool).await?;
    let rooms: Vec<RoomListing> = VIEWING_ROOMS.iter().map(|room| sheet.listing(room)).collect();
    Ok(Json(json!({ "success": true, "rooms": rooms })))
}

// GET /api/rooms/{id}
async fn get_room(State(state): State<Arc<AppState>>, AppPath(id): AppPath<String>) -> AppResult<impl IntoResponse> {
    let room = find_room(&id).ok_or_else(|| AppError::not_found("Room not found"))?;
    let sheet = pricing::price_sheet(&state.db.pool).await?;
    Ok(Json(json!({ "success": true, "room": sheet.listing(room) })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeatMapParams {
    movie_id: Option<String>,
    room_id: Option<String>,
}

// GET /api/showtimes/{showtime_id}/seats?movieId=&roomId=
async fn seat_map(
    State(state): State<Arc<AppState>>,
    AppPath(showtime_id): AppPath<String>,
    AppQuery(params): AppQuery<SeatMapParams>,
) -> AppResult<impl IntoResponse> {
    let (Some(movie_id), Some(room_id)) = (params.movie_id, params.room_id) else {
        return Err(AppError::validation("Movie ID and Room ID are required"));
    };
    let map = schedule::seat_map(&state.db.pool, &showtime_id, &movie_id, &room_id).await?;
    Ok(Json(json!({ "success": true, "showtimeId": map.showtime_id, "room": map.room, "price": map.price, "seats": map.seats })))
}

// GET /api/pricing
async fn public_pricing(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let pricing = pricing::public_pricing(&state.db.pool).await?;
    Ok(Json(json!({ "success": true, "pricing": pricing })))
}
