use chrono::{Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{Booking, BookingStatus, NewBooking, PaymentMethod},
        movie::MovieId,
        room::{find_room, ViewingRoom},
        seat::{lookup_seat, Seat},
        showtime::parse_showtime_id,
    },
    services::pricing,
};

pub const SERVICE_FEE: i64 = 50;
pub const MAX_SEATS_PER_BOOKING: usize = 10;
const CODE_ATTEMPTS: usize = 10;

/// A seat in a request body: either `"D7"` or an object carrying `id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeatSelection {
    Id(String),
    Seat { id: String },
}

impl SeatSelection {
    pub fn id(&self) -> &str {
        match self {
            SeatSelection::Id(id) | SeatSelection::Seat { id } => id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub movie_id: Option<MovieId>,
    pub showtime_id: Option<String>,
    pub room_id: Option<String>,
    #[serde(default)]
    pub seats: Vec<SeatSelection>,
    pub total_price: Option<f64>,
    pub status: Option<BookingStatus>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub room_id: String,
    #[serde(default)]
    pub seats: Vec<SeatSelection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub seats: Vec<Seat>,
    pub subtotal: i64,
    pub service_fee: i64,
    pub total: i64,
}

pub fn generate_booking_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..100_000);
    format!("CMX-{}-{:05}", Utc::now().year(), n)
}

/// Prices the given seats of a room from the seat grid at its current room price.
pub fn quote_seats(room: &ViewingRoom, room_price: i64, seat_ids: &[&str]) -> AppResult<Quote> {
    let seats = seat_ids
        .iter()
        .map(|id| {
            lookup_seat(room, room_price, id)
                .ok_or_else(|| AppError::validation(format!("Seat {id} does not exist in {}", room.name)))
        })
        .collect::<AppResult<Vec<Seat>>>()?;
    let subtotal: i64 = seats.iter().map(|s| s.price).sum();
    let service_fee = if seats.is_empty() { 0 } else { SERVICE_FEE };
    Ok(Quote { seats, subtotal, service_fee, total: subtotal + service_fee })
}

pub async fn quote(pool: &SqlitePool, req: &QuoteRequest) -> AppResult<Quote> {
    let room = find_room(&req.room_id).ok_or_else(|| AppError::not_found("Room not found"))?;
    let price = pricing::room_price(pool, room.room_type).await?;
    let ids: Vec<&str> = req.seats.iter().map(SeatSelection::id).collect();
    quote_seats(room, price, &ids)
}

pub async fn occupied_seats(pool: &SqlitePool, showtime_id: &str) -> AppResult<HashSet<String>> {
    Ok(Booking::held_seat_ids(pool, showtime_id).await?.into_iter().collect())
}

async fn unused_booking_code(pool: &SqlitePool) -> AppResult<String> {
    let mut code = generate_booking_code();
    for _ in 1..CODE_ATTEMPTS {
        if !Booking::code_exists(pool, &code).await? {
            break;
        }
        warn!("Booking code {} already taken, regenerating", code);
        code = generate_booking_code();
    }
    Ok(code)
}

pub async fn create(pool: &SqlitePool, user_id: i64, req: BookingRequest) -> AppResult<Booking> {
    let movie_id = req.movie_id.map(MovieId::into_string).filter(|s| !s.is_empty());
    let (Some(movie_id), Some(showtime_id), Some(room_id)) = (movie_id, req.showtime_id, req.room_id) else {
        return Err(AppError::validation("Missing required booking information"));
    };
    if req.seats.is_empty() {
        return Err(AppError::validation("Missing required booking information"));
    }
    if req.seats.len() > MAX_SEATS_PER_BOOKING {
        return Err(AppError::validation(format!(
            "A booking can hold at most {MAX_SEATS_PER_BOOKING} seats"
        )));
    }
    if req.total_price.is_some_and(|p| !p.is_finite() || p <= 0.0) {
        return Err(AppError::validation("Invalid total price"));
    }
    let status = req.status.unwrap_or(BookingStatus::Confirmed);
    if status == BookingStatus::Cancelled {
        return Err(AppError::validation("Invalid booking status"));
    }

    let room = find_room(&room_id).ok_or_else(|| AppError::validation("Invalid room"))?;
    if parse_showtime_id(&showtime_id, &movie_id, &room_id).is_none() {
        return Err(AppError::validation("Showtime does not match the selected movie and room"));
    }

    let ids: Vec<&str> = req.seats.iter().map(SeatSelection::id).collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    if unique.len() != ids.len() {
        return Err(AppError::validation("Duplicate seats in booking"));
    }

    let room_price = pricing::room_price(pool, room.room_type).await?;
    let quote = quote_seats(room, room_price, &ids)?;

    let held = occupied_seats(pool, &showtime_id).await?;
    let mut taken: Vec<&str> = ids.iter().copied().filter(|id| held.contains(*id)).collect();
    if !taken.is_empty() {
        taken.sort_unstable();
        return Err(AppError::Conflict(format!("Seats already booked: {}", taken.join(", "))));
    }

    let booking = Booking::insert(
        pool,
        &NewBooking {
            user_id,
            movie_id,
            showtime_id,
            room_id,
            seats: quote.seats,
            total_price: quote.total as f64,
            status,
            payment_method: req.payment_method,
            booking_code: unused_booking_code(pool).await?,
        },
    )
    .await?;

    info!(
        "Booking {} created for user {} ({} seats, {:.2})",
        booking.booking_code,
        user_id,
        booking.seats.0.len(),
        booking.total_price
    );
    Ok(booking)
}

pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Booking>> {
    Ok(Booking::list_for_user(pool, user_id).await?)
}

pub async fn get(pool: &SqlitePool, id: i64, user_id: i64) -> AppResult<Booking> {
    let booking = Booking::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))?;
    if booking.user_id != user_id {
        return Err(AppError::Forbidden("Unauthorized access to this booking".into()));
    }
    Ok(booking)
}

pub async fn cancel(pool: &SqlitePool, id: i64, user_id: i64) -> AppResult<Booking> {
    let booking = Booking::find_by_id(pool, id)
        .await?
        .filter(|b| b.user_id == user_id)
        .ok_or_else(|| AppError::validation("Booking not found or unauthorized"))?;
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::validation("Booking is already cancelled"));
    }
    let cancelled = Booking::set_status(pool, id, BookingStatus::Cancelled)
        .await?
        .ok_or_else(|| AppError::validation("Booking not found or unauthorized"))?;
    info!("Booking {} cancelled by user {}", cancelled.booking_code, user_id);
    Ok(cancelled)
}
