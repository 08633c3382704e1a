//! Showtime listings and seat maps, both derived on the fly from the room
//! catalog, live pricing and the seats held by bookings.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{
        room::{find_room, ViewingRoom},
        seat::{generate_seat_map, SeatRow},
        showtime::{generate_showtimes, parse_showtime_id, Showtime},
    },
    services::{booking::occupied_seats, pricing},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMap {
    pub showtime_id: String,
    pub room: &'static ViewingRoom,
    pub price: i64,
    pub seats: Vec<SeatRow>,
}

fn room(room_id: &str) -> AppResult<&'static ViewingRoom> {
    find_room(room_id).ok_or_else(|| AppError::not_found("Room not found"))
}

pub async fn showtimes(pool: &SqlitePool, movie_id: &str, room_id: &str, date: NaiveDate) -> AppResult<Vec<Showtime>> {
    let room = room(room_id)?;
    let price = pricing::room_price(pool, room.room_type).await?;
    let mut shows = generate_showtimes(movie_id, room.id, room.capacity, date, price);
    for show in &mut shows {
        let held = occupied_seats(pool, &show.id).await?.len() as u32;
        show.available_seats = show.available_seats.saturating_sub(held);
    }
    Ok(shows)
}

pub async fn seat_map(pool: &SqlitePool, showtime_id: &str, movie_id: &str, room_id: &str) -> AppResult<SeatMap> {
    let room = room(room_id)?;
    if parse_showtime_id(showtime_id, movie_id, room_id).is_none() {
        return Err(AppError::validation("Showtime does not match the selected movie and room"));
    }
    let price = pricing::room_price(pool, room.room_type).await?;
    let occupied = occupied_seats(pool, showtime_id).await?;
    Ok(SeatMap {
        showtime_id: showtime_id.to_string(),
        room,
        price,
        seats: generate_seat_map(room, price, &occupied),
    })
}
